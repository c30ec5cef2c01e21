//! The workout session state machine.
//!
//! A [`WorkoutMachine`] walks one [`DayWorkout`] from the first warmup exercise to
//! the end of cardio. It is a plain value: every transition borrows the current
//! snapshot and returns the next one, together with an [`Effect`] when the
//! persistence layer needs to hear about it. The caller owns the clock and the
//! network; the machine only counts seconds it is told about.
//!
//! ```text
//! NotStarted --start--> InPhase(warmup, 0) --advance--> ... --advance--> Completed
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkoutError;
use crate::models::{CompleteSessionInput, ExerciseRecord, StartSessionInput};
use crate::schedule::{DayWorkout, Exercise, Phase};
use crate::timer::{Countdown, Tick};

/// Where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InPhase { phase: Phase, exercise_index: usize },
    Completed,
}

/// Work the caller must perform on behalf of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the store to create a session. The returned id goes back in through
    /// [`WorkoutMachine::attach_session`].
    CreateSession(StartSessionInput),
    /// Report the finished session.
    ReportCompletion {
        session_id: Uuid,
        report: CompleteSessionInput,
    },
}

/// The next snapshot plus whatever the caller has to do about it.
#[derive(Debug, Clone)]
pub struct Transition {
    pub machine: WorkoutMachine,
    pub effect: Option<Effect>,
}

impl Transition {
    fn quiet(machine: WorkoutMachine) -> Self {
        Self {
            machine,
            effect: None,
        }
    }
}

/// Per-phase completion flags. Flags only ever flip from false to true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompletionFlags {
    warmup: Vec<bool>,
    strength: Vec<bool>,
    cardio: Vec<bool>,
}

impl CompletionFlags {
    fn for_workout(workout: &DayWorkout) -> Self {
        Self {
            warmup: vec![false; workout.warmup.len()],
            strength: vec![false; workout.strength.len()],
            cardio: vec![false; workout.cardio.len()],
        }
    }

    fn get(&self, phase: Phase) -> &[bool] {
        match phase {
            Phase::Warmup => &self.warmup,
            Phase::Strength => &self.strength,
            Phase::Cardio => &self.cardio,
        }
    }

    fn mark(&mut self, phase: Phase, index: usize) {
        let flags = match phase {
            Phase::Warmup => &mut self.warmup,
            Phase::Strength => &mut self.strength,
            Phase::Cardio => &mut self.cardio,
        };
        if let Some(flag) = flags.get_mut(index) {
            *flag = true;
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkoutMachine {
    workout: Arc<DayWorkout>,
    state: SessionState,
    flags: CompletionFlags,
    countdown: Countdown,
    elapsed: u32,
    paused: bool,
    session_id: Option<Uuid>,
}

impl WorkoutMachine {
    pub fn new(workout: DayWorkout) -> Self {
        Self {
            workout: Arc::new(workout),
            state: SessionState::NotStarted,
            flags: CompletionFlags::default(),
            countdown: Countdown::new(0),
            elapsed: 0,
            paused: true,
            session_id: None,
        }
    }

    pub fn workout(&self) -> &DayWorkout {
        &self.workout
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_rest_day(&self) -> bool {
        self.workout.is_rest_day()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::InPhase { .. })
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn phase(&self) -> Option<Phase> {
        match self.state {
            SessionState::InPhase { phase, .. } => Some(phase),
            _ => None,
        }
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.state {
            SessionState::InPhase {
                phase,
                exercise_index,
            } => self.workout.exercises(phase).get(exercise_index),
            _ => None,
        }
    }

    pub fn completed_flags(&self, phase: Phase) -> &[bool] {
        self.flags.get(phase)
    }

    /// `(done, total)` exercises in the given phase.
    pub fn phase_progress(&self, phase: Phase) -> (usize, usize) {
        let flags = self.flags.get(phase);
        (
            flags.iter().filter(|done| **done).count(),
            self.workout.exercises(phase).len(),
        )
    }

    /// The request body announcing this workout to the store.
    pub fn start_request(&self) -> StartSessionInput {
        let records = |phase: Phase| {
            self.workout
                .exercises(phase)
                .iter()
                .map(|e| ExerciseRecord::from_exercise(e, false))
                .collect()
        };
        StartSessionInput {
            day: self.workout.day.clone(),
            warmup_exercises: records(Phase::Warmup),
            strength_exercises: records(Phase::Strength),
            cardio_exercises: records(Phase::Cardio),
        }
    }

    pub fn start(&self) -> Result<Transition, WorkoutError> {
        if self.is_rest_day() {
            return Err(WorkoutError::RestDay(self.workout.day.clone()));
        }
        if self.state != SessionState::NotStarted {
            return Err(WorkoutError::AlreadyStarted);
        }
        let Some(phase) = self.first_populated_phase(Some(Phase::Warmup)) else {
            return Err(WorkoutError::RestDay(self.workout.day.clone()));
        };

        let mut next = self.clone();
        next.flags = CompletionFlags::for_workout(&self.workout);
        next.elapsed = 0;
        next.paused = false;
        next.enter(phase, 0);

        tracing::debug!(day = %self.workout.day, "workout started");

        Ok(Transition {
            effect: Some(Effect::CreateSession(self.start_request())),
            machine: next,
        })
    }

    /// Remember the id the store handed back for this session.
    pub fn attach_session(&self, session_id: Uuid) -> Self {
        let mut next = self.clone();
        next.session_id = Some(session_id);
        next
    }

    /// Finish the current exercise, by timer expiry or by skipping it.
    pub fn advance(&self) -> Result<Transition, WorkoutError> {
        let SessionState::InPhase {
            phase,
            exercise_index,
        } = self.state
        else {
            return Err(WorkoutError::NotActive);
        };

        let mut next = self.clone();
        next.flags.mark(phase, exercise_index);

        if exercise_index + 1 < self.workout.exercises(phase).len() {
            next.enter(phase, exercise_index + 1);
            return Ok(Transition::quiet(next));
        }

        if let Some(following) = self.first_populated_phase(phase.next()) {
            tracing::debug!(from = phase.as_str(), to = following.as_str(), "phase complete");
            next.enter(following, 0);
            return Ok(Transition::quiet(next));
        }

        next.state = SessionState::Completed;
        next.paused = true;
        tracing::info!(
            day = %self.workout.day,
            elapsed = next.elapsed,
            "workout completed"
        );

        let effect = next.session_id.map(|session_id| Effect::ReportCompletion {
            session_id,
            report: next.completion_report(),
        });

        Ok(Transition {
            machine: next,
            effect,
        })
    }

    pub fn pause(&self) -> Self {
        let mut next = self.clone();
        if next.is_active() {
            next.paused = true;
        }
        next
    }

    pub fn resume(&self) -> Self {
        let mut next = self.clone();
        if next.is_active() {
            next.paused = false;
        }
        next
    }

    pub fn toggle_pause(&self) -> Self {
        if self.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// One second of wall time. Ignored unless a workout is running.
    ///
    /// When the countdown runs out the exercise is advanced, so the returned
    /// transition may carry the completion report.
    pub fn tick(&self) -> Transition {
        if !self.is_active() || self.paused {
            return Transition::quiet(self.clone());
        }

        let mut next = self.clone();
        next.elapsed += 1;

        let expired = next.countdown.is_expired() || next.countdown.tick() == Tick::Expired;
        if !expired {
            return Transition::quiet(next);
        }

        match next.advance() {
            Ok(transition) => transition,
            // advance only fails outside InPhase, which was checked above
            Err(_) => Transition::quiet(next),
        }
    }

    /// The completion body, built from the current flags.
    pub fn completion_report(&self) -> CompleteSessionInput {
        let records = |phase: Phase| {
            self.workout
                .exercises(phase)
                .iter()
                .zip(self.flags.get(phase))
                .map(|(e, done)| ExerciseRecord::from_exercise(e, *done))
                .collect()
        };
        CompleteSessionInput {
            total_duration: self.elapsed,
            warmup_exercises: records(Phase::Warmup),
            strength_exercises: records(Phase::Strength),
            cardio_exercises: records(Phase::Cardio),
        }
    }

    fn enter(&mut self, phase: Phase, exercise_index: usize) {
        self.state = SessionState::InPhase {
            phase,
            exercise_index,
        };
        let duration = self
            .workout
            .exercises(phase)
            .get(exercise_index)
            .map(|e| e.duration)
            .unwrap_or(0);
        self.countdown = Countdown::new(duration);
    }

    fn first_populated_phase(&self, from: Option<Phase>) -> Option<Phase> {
        let mut candidate = from;
        while let Some(phase) = candidate {
            if !self.workout.exercises(phase).is_empty() {
                return Some(phase);
            }
            candidate = phase.next();
        }
        None
    }
}
