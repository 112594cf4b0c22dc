//! Dataspace Reaper - retention service for the decision-cycle dataspace
//!
//! Runs the reaper in the background and serves the operator API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dataspace_reaper::api::{create_router, AppState};
use dataspace_reaper::{Config, Reaper};

/// Main entry point for the dataspace reaper.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Validate the dataspace configuration and build the reaper
/// 4. Start the background reaper worker
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Stop the reaper on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dataspace_reaper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dataspace Reaper");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, interval={}s, min_interval={}s, stop_timeout={}s",
        config.server_port,
        config.seconds_between_runs,
        config.min_seconds_between_runs,
        config.stop_timeout
    );

    let dataspace = config.load_dataspace()?;
    let mut reaper = Reaper::new(&dataspace).context("invalid dataspace configuration")?;
    reaper.set_min_seconds_between_runs(config.min_seconds_between_runs);
    reaper
        .set_seconds_between_runs(config.seconds_between_runs)
        .context("invalid reaper interval")?;
    reaper.set_stop_timeout(config.stop_timeout());

    reaper.start(config.start_delay())?;
    info!("Reaper worker started");

    let state = AppState::new(reaper);
    let app = create_router(state.clone());

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the reaper.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    let mut reaper = state.reaper.lock().await;
    reaper.stop().await;
    info!("Reaper stopped in state {}", state.lifecycle.get());
}
