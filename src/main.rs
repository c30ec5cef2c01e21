use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymtrack::{
    api,
    client::GymClient,
    config::AppConfig,
    db, render,
    runner::{spawn_stdin_commands, RunOutcome, Runner},
    workout::WorkoutMachine,
};

#[derive(Parser)]
#[command(name = "gymtrack")]
#[command(about = "Personal workout and diet tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gymtrack server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(short, long)]
        bind: Option<String>,

        /// Do not start the daily reminder
        #[arg(long)]
        no_reminder: bool,
    },
    /// Run today's workout in the terminal
    Train {
        /// Server API URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Show the activity heatmap and streaks
    Stats {
        /// Server API URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Run the reminder check now
    Remind {
        /// Server API URL
        #[arg(long)]
        url: Option<String>,
    },
}

/// Initialize tracing with output to stderr (terminal commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "gymtrack=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Terminal commands print to stdout; keep logs out of the way
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(mut config: AppConfig, start_reminder: bool) -> anyhow::Result<()> {
    let db = match config.db_path.take() {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let addr = format!("{}:{}", config.bind, config.port);
    tracing::info!("Starting gymtrack server on {}", addr);

    let state = api::AppState::new(db, config);
    if start_reminder {
        state.reminder.clone().spawn();
    }
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gymtrack server listening on http://{}", addr);

    // Peer addresses feed the login rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn train(client: GymClient) -> anyhow::Result<()> {
    let schedule = client.get_schedule().await?;
    let machine = WorkoutMachine::new(schedule.workout);

    let mut runner = Runner::new(&client, std::io::stdout());

    tokio::select! {
        outcome = runner.run(machine, spawn_stdin_commands()) => {
            match outcome? {
                RunOutcome::Completed { elapsed } => {
                    tracing::info!(elapsed, "workout finished");
                }
                RunOutcome::Quit { elapsed } => {
                    tracing::info!(elapsed, "workout abandoned");
                }
                RunOutcome::RestDay => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = AppConfig::load()?;
    let client_url = config.client_url.clone();
    let client_for = move |url: Option<String>| GymClient::new(url.unwrap_or(client_url));

    match cli.command {
        Some(Commands::Serve {
            port,
            bind,
            no_reminder,
        }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config, !no_reminder).await?;
        }
        Some(Commands::Train { url }) => {
            train(client_for(url)).await?;
        }
        Some(Commands::Stats { url }) => {
            let summary = client_for(url).get_stats().await?;
            print!("{}", render::render_summary(&summary));
        }
        Some(Commands::Remind { url }) => {
            let outcome = client_for(url).trigger_reminder().await?;
            println!("{}", outcome.message);
        }
        None => {
            // Default: start server
            serve(config, true).await?;
        }
    }

    Ok(())
}
