//! GHRSST API Server
//!
//! Point and bounding-box queries over daily sea-surface snapshots.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ghrsst_api::config::{ServiceConfig, DEFAULT_CONFIG_PATH};
use ghrsst_api::state::AppState;

/// GHRSST API Server
#[derive(Parser, Debug)]
#[command(name = "ghrsst-api")]
#[command(about = "Point and bounding-box query server for daily GHRSST snapshots")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "GHRSST_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "GHRSST_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "GHRSST_CONFIG")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting GHRSST API server");

    let config = ServiceConfig::load(&args.config)?;
    info!(
        zarr_path = %config.zarr_path.display(),
        point_limit = config.engine.point_limit,
        max_days = config.engine.max_days,
        "Configuration loaded"
    );

    // Initialize application state
    let state = Arc::new(AppState::new(config, Some(prometheus_handle))?);

    match state.bounds.refresh().await {
        Ok(bounds) => info!(earliest = %bounds.earliest, latest = %bounds.latest, "Bounds loaded"),
        Err(e) => tracing::warn!(error = %e, "No bounds at startup; serving 503 until data appears"),
    }
    state.spawn_bounds_refresh();

    let app = ghrsst_api::app(state);

    // Parse listen address
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("GHRSST API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
