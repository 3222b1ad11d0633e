//! Escape console binary: runs the game loop against the simulated board, driven by
//! commands typed on stdin.

use std::time::Duration;

use anyhow::Context;
use escape_console::{
    Millis,
    config::AppConfig,
    hal::{SimulatedHardware, sim::SimCommand},
    state::Console,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long a `press` or `key` command keeps its input down.
const TAP_MS: Millis = 150;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let board = SimulatedHardware::new();
    let started = Instant::now();
    let mut console = Console::new(&config, Box::new(board.clone()), 0);

    let (tx, mut commands) = mpsc::channel(32);
    tokio::spawn(read_commands(tx));

    let mut ticker = tokio::time::interval(Duration::from_millis(config.timing.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut taps = Taps::default();
    info!(
        tick_ms = config.timing.tick_ms,
        "console running; type `press`, `pot <0-1023>`, `key <1-8>`, `status` or `quit`"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("command input closed");
                    break;
                };
                let now = elapsed_ms(started);
                match command {
                    SimCommand::Quit => break,
                    SimCommand::Status => {
                        let snapshot = serde_json::to_string(&console.snapshot())
                            .context("serializing session snapshot")?;
                        info!(snapshot = %snapshot, "session status");
                    }
                    SimCommand::Press => {
                        board.apply(&command);
                        taps.button = Some(now + TAP_MS);
                    }
                    SimCommand::Key(_) => {
                        board.apply(&command);
                        taps.keys = Some(now + TAP_MS);
                    }
                    SimCommand::Hold | SimCommand::Release => {
                        taps.button = None;
                        board.apply(&command);
                    }
                    SimCommand::Keys(_) => {
                        taps.keys = None;
                        board.apply(&command);
                    }
                    SimCommand::Pot(_) => board.apply(&command),
                }
            }
            _ = ticker.tick() => {
                let now = elapsed_ms(started);
                taps.release_due(&board, now);
                console.tick(now);
            }
        }
    }

    let snapshot = console.snapshot();
    info!(
        phase = %snapshot.phase,
        total_presses = snapshot.total_presses,
        games_completed = snapshot.results.len(),
        total_score = snapshot.total_score,
        "console stopped"
    );
    Ok(())
}

/// Release deadlines for tapped inputs.
#[derive(Debug, Default)]
struct Taps {
    button: Option<Millis>,
    keys: Option<Millis>,
}

impl Taps {
    fn release_due(&mut self, board: &SimulatedHardware, now: Millis) {
        if self.button.is_some_and(|at| now >= at) {
            self.button = None;
            board.set_button(false);
        }
        if self.keys.is_some_and(|at| now >= at) {
            self.keys = None;
            board.set_keys(0);
        }
    }
}

/// Parse stdin lines into commands until input closes or the console stops listening.
async fn read_commands(tx: mpsc::Sender<SimCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<SimCommand>() {
            Ok(command) => {
                if tx.send(command).await.is_err() {
                    debug!("console stopped; dropping command reader");
                    break;
                }
            }
            Err(err) => warn!(input = %line, error = %err, "ignoring command"),
        }
    }
}

fn elapsed_ms(started: Instant) -> Millis {
    Millis::try_from(started.elapsed().as_millis()).unwrap_or(Millis::MAX)
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and stop the console gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
