use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ghost_dodge::config::GameConfig;
use ghost_dodge::game::input_buffer::{InputBufferError, InputCommand, InputSender};
use ghost_dodge::metrics::Metrics;
use ghost_dodge::session::{start_game_loop, GameSession};
use ghost_dodge::sink::JsonLinesSink;

/// Read one command token per line from stdin until EOF
async fn read_stdin_commands(sender: InputSender) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command: InputCommand = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        match sender.try_send(command) {
            Ok(()) => {}
            Err(InputBufferError::Full) => warn!("Input buffer full, dropping {:?}", command),
            Err(InputBufferError::Disconnected) => break,
        }
    }

    info!("Input closed");
    Ok(())
}

#[cfg(feature = "metrics_server")]
fn spawn_metrics_server(metrics: Arc<Metrics>, port: u16) {
    tokio::spawn(async move {
        if let Err(e) = ghost_dodge::metrics::start_metrics_server(metrics, port).await {
            error!("Metrics server error: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics_server"))]
fn spawn_metrics_server(_metrics: Arc<Metrics>, port: u16) {
    warn!("METRICS_PORT={} ignored: built without the metrics_server feature", port);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the JSON lines
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("Ghost Dodge v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load_or_default();
    info!(
        "Configuration loaded: arena {}x{}, policy {:?}, seed {:?}",
        config.arena_width, config.arena_height, config.obstacle_policy, config.rng_seed
    );

    let metrics = Arc::new(Metrics::new());

    if let Some(port) = config.metrics_port {
        spawn_metrics_server(metrics.clone(), port);
    }

    let session = GameSession::new(
        config,
        Box::new(JsonLinesSink::new(std::io::stdout())),
        metrics.clone(),
    )
    .context("Invalid game configuration")?;
    let sender = session.input_sender();
    let session = Arc::new(RwLock::new(session));

    tokio::spawn(async move {
        if let Err(e) = read_stdin_commands(sender).await {
            error!("Input reader error: {}", e);
        }
    });

    let game_loop = start_game_loop(session.clone());
    info!("Ready. Send `space` (or an empty line) to start, `jump`, `left`/`right`, `-left`/`-right`");

    tokio::select! {
        result = game_loop => {
            if let Err(e) = result {
                error!("Game loop task failed: {}", e);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutting down...");
        }
    }

    // Cleanup
    let mut guard = session.write().await;
    if let Some(result) = guard.shutdown() {
        info!("Final score: {}", result.final_score);
    }
    info!(
        "Best score {} over {} matches",
        guard.history().best_score(),
        guard.history().len()
    );

    Ok(())
}
