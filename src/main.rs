//! Seawatch - maritime safety monitoring for small craft.
//!
//! Runs the safety monitor and serves its snapshot over HTTP.
//!
//! # API Endpoints
//!
//! - `GET /safety/snapshot` - Current safety snapshot
//! - `POST /safety/refresh` - Request a refresh
//! - `PUT /safety/auto-refresh` - Toggle periodic refresh
//! - `GET /safety/history` - Recent snapshot log
//! - `GET /safety/map` - Snapshot rendered for a map
//! - `GET /maritime/*` - On-demand maritime queries
//! - `GET /health` - Health check
//!
//! Configuration is read from `SEAWATCH_*` environment variables; see
//! [`seawatch::config`].

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use seawatch::api::{self, AppState};
use seawatch::config::MonitorConfig;
use seawatch::monitor::SafetyMonitor;
use seawatch::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("seawatch=info".parse()?))
        .init();

    let config = MonitorConfig::from_env();

    info!(
        port = config.port,
        db_url = %config.database_url,
        remote = config.maritime_api_url.as_deref().unwrap_or("none"),
        radius_km = config.radius_km,
        refresh_secs = config.refresh_interval.as_secs(),
        "Starting Seawatch"
    );

    // The snapshot log is optional; the monitor runs without it.
    let storage = match Storage::new(&config.database_url).await {
        Ok(storage) => {
            info!("Snapshot log initialized");
            Some(storage)
        }
        Err(e) => {
            warn!(error = %e, "Snapshot log unavailable, continuing without it");
            None
        }
    };

    let monitor = SafetyMonitor::from_config(&config, storage).await;
    monitor.start();

    let app = api::router(AppState {
        monitor: monitor.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Seawatch is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
