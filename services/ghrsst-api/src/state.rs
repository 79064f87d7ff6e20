//! Application state for the GHRSST API.

use std::sync::Arc;

use anyhow::{Context, Result};
use grid_query::{BoundsIndex, QueryEngine, SnapshotStore, ZarrSnapshotStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Query engine over the snapshot store.
    pub engine: QueryEngine,

    /// Bounds cache shared with the engine and the refresh task.
    pub bounds: Arc<BoundsIndex>,

    /// Loaded configuration.
    pub config: ServiceConfig,

    /// Prometheus handle for `/metrics`; `None` when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state over the configured Zarr store.
    pub fn new(config: ServiceConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let store = ZarrSnapshotStore::new(&config.zarr_path)
            .with_context(|| format!("Failed to open Zarr store {:?}", config.zarr_path))?;
        info!(root = %config.zarr_path.display(), "Opened Zarr snapshot store");
        Ok(Self::with_store(Arc::new(store), config, prometheus))
    }

    /// Create state over any snapshot store.
    pub fn with_store(
        store: Arc<dyn SnapshotStore>,
        config: ServiceConfig,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let bounds = Arc::new(BoundsIndex::new(
            store.clone(),
            config.index_json.clone(),
            config.bounds_refresh_interval(),
        ));
        let engine = QueryEngine::new(store, bounds.clone(), config.engine.clone());
        Self {
            engine,
            bounds,
            config,
            prometheus,
        }
    }

    /// Periodically rescan the store so newly published days become visible.
    pub fn spawn_bounds_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let bounds = self.bounds.clone();
        let period = self.config.bounds_refresh_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match bounds.refresh().await {
                    Ok(record) => tracing::debug!(
                        earliest = %record.earliest,
                        latest = %record.latest,
                        "Bounds refreshed"
                    ),
                    Err(e) => warn!(error = %e, "Bounds refresh failed"),
                }
            }
        })
    }
}
