use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use slipway::config::EngineConfig;
use slipway::engine::Engine;
use slipway::http::{self, AppState};
use slipway::partner::NoPartnerFeed;
use slipway::sweeper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("SLIPWAY_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    slipway::observability::init(metrics_port);

    let port = std::env::var("SLIPWAY_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("SLIPWAY_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let data_dir = std::env::var("SLIPWAY_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let admin_token = std::env::var("SLIPWAY_ADMIN_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    let config = EngineConfig::from_env()?;

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;
    let wal_path = PathBuf::from(&data_dir).join("reservations.wal");

    let engine = Arc::new(Engine::new(
        wal_path,
        config.clone(),
        Arc::new(NoPartnerFeed),
    )?);

    // Background hygiene: expired-hold sweep + WAL compaction. Neither is
    // load-bearing; expiry is re-checked on every read.
    tokio::spawn(sweeper::run_sweeper(engine.clone()));
    tokio::spawn(sweeper::run_compactor(
        engine.clone(),
        config.compact_threshold,
    ));

    let state = AppState {
        engine,
        admin_token: admin_token.clone(),
    };
    let app = http::create_router(state);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("slipway listening on {addr}");
    info!("  data_dir: {data_dir}");
    info!("  hold_duration: {} min", config.hold_duration_ms / 60_000);
    info!(
        "  admin surface: {}",
        if admin_token.is_some() { "enabled" } else { "disabled" }
    );
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("slipway stopped");
    Ok(())
}

/// Stop accepting on SIGTERM/ctrl-c; axum drains in-flight connections.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    info!("shutdown signal received, draining connections");
}
