//! Drives a [`WorkoutMachine`] from the terminal.
//!
//! A one-second ticker feeds [`WorkoutMachine::tick`]; typed commands feed the
//! other transitions. Effects are handed to a [`SessionStore`].

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::models::{CompleteSessionInput, StartSessionInput};
use crate::render::{completion_line, exercise_line};
use crate::workout::{Effect, Transition, WorkoutMachine};

/// Where a running workout reports its progress.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session and return its id.
    async fn create_session(&self, input: &StartSessionInput) -> Result<Uuid>;

    async fn complete_session(&self, id: Uuid, report: &CompleteSessionInput) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Skip,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::TogglePause),
            "s" | "skip" => Some(Self::Skip),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    RestDay,
    Completed { elapsed: u32 },
    /// The user quit. Nothing is cancelled on the server.
    Quit { elapsed: u32 },
}

pub struct Runner<'a, S, W> {
    store: &'a S,
    out: W,
}

impl<'a, S: SessionStore, W: Write> Runner<'a, S, W> {
    pub fn new(store: &'a S, out: W) -> Self {
        Self { store, out }
    }

    /// Run the workout to completion or until the user quits.
    ///
    /// When `commands` closes the workout keeps running on the timer alone.
    pub async fn run(
        &mut self,
        machine: WorkoutMachine,
        mut commands: mpsc::Receiver<Command>,
    ) -> Result<RunOutcome> {
        if machine.is_rest_day() {
            writeln!(self.out, "{}: rest day. Recover well.", machine.workout().day)?;
            return Ok(RunOutcome::RestDay);
        }

        writeln!(self.out, "{}", machine.workout().title)?;
        writeln!(self.out, "Commands: p = pause/resume, s = skip, q = quit")?;

        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        let Transition { mut machine, effect } = machine.start()?;
        self.show(&machine)?;

        // The countdown runs while the session is being created
        let store = self.store;
        let mut creating = match effect {
            Some(Effect::CreateSession(input)) => {
                Some(Box::pin(async move { store.create_session(&input).await }))
            }
            _ => None,
        };

        let mut commands_open = true;
        loop {
            tokio::select! {
                biased;

                created = until_done(&mut creating), if creating.is_some() => {
                    creating = None;
                    machine = self.session_created(machine, created)?;
                }
                _ = ticker.tick() => {
                    let before = machine.state();
                    machine = self.apply(machine.tick()).await?;
                    if machine.state() != before {
                        self.show(&machine)?;
                    }
                }
                command = commands.recv(), if commands_open => match command {
                    Some(Command::TogglePause) => {
                        machine = machine.toggle_pause();
                        self.show(&machine)?;
                    }
                    Some(Command::Skip) => {
                        machine = self.apply(machine.advance()?).await?;
                        self.show(&machine)?;
                    }
                    Some(Command::Quit) => {
                        writeln!(self.out, "Workout abandoned.")?;
                        return Ok(RunOutcome::Quit {
                            elapsed: machine.elapsed_seconds(),
                        });
                    }
                    None => commands_open = false,
                },
            }

            if machine.is_completed() {
                writeln!(self.out, "{}", completion_line(&machine))?;
                return Ok(RunOutcome::Completed {
                    elapsed: machine.elapsed_seconds(),
                });
            }
        }
    }

    /// Attach the new session id, or carry on unrecorded if creation failed.
    fn session_created(&mut self, machine: WorkoutMachine, created: Result<Uuid>) -> Result<WorkoutMachine> {
        match created {
            Ok(id) => Ok(machine.attach_session(id)),
            Err(e) => {
                tracing::warn!(error = %e, "could not create session");
                writeln!(self.out, "Could not save session ({}); progress will not be recorded.", e)?;
                Ok(machine)
            }
        }
    }

    /// Report completion if the transition finished the session.
    async fn apply(&mut self, transition: Transition) -> Result<WorkoutMachine> {
        let Transition { machine, effect } = transition;
        if let Some(Effect::ReportCompletion { session_id, report }) = effect {
            if let Err(e) = self.store.complete_session(session_id, &report).await {
                tracing::warn!(error = %e, %session_id, "could not report completion");
                writeln!(self.out, "Could not record completion: {}", e)?;
            }
        }
        Ok(machine)
    }

    fn show(&mut self, machine: &WorkoutMachine) -> Result<()> {
        if let Some(line) = exercise_line(machine) {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }
}

/// Await the request in `slot`. An empty slot never resolves.
async fn until_done<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot.as_mut() {
        Some(request) => request.await,
        None => std::future::pending().await,
    }
}

/// Forward stdin lines as commands until stdin closes or the receiver goes away.
pub fn spawn_stdin_commands() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => tracing::debug!(input = %line, "ignoring unknown command"),
            }
        }
    });
    rx
}
