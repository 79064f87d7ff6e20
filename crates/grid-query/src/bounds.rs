//! Bounds Index: the inclusive `[earliest, latest]` range of published days.
//!
//! The record is served from memory for `refresh_interval` and rebuilt by
//! scanning the store once that expires. The persisted index file is only
//! consulted on a cold start, and only when it is consistent with the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{QueryError, Result, StoreError};
use crate::store::SnapshotStore;
use crate::types::BoundsRecord;

#[derive(Debug, Clone, Copy)]
struct CachedBounds {
    record: BoundsRecord,
    loaded_at: Instant,
}

/// Cached view of the store's date bounds.
pub struct BoundsIndex {
    store: Arc<dyn SnapshotStore>,
    index_path: Option<PathBuf>,
    refresh_interval: Duration,
    cached: RwLock<Option<CachedBounds>>,
}

impl BoundsIndex {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        index_path: Option<PathBuf>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            store,
            index_path,
            refresh_interval,
            cached: RwLock::new(None),
        }
    }

    /// Current bounds; `NoDataAvailable` when the store holds no snapshot.
    pub async fn get_bounds(&self) -> Result<BoundsRecord> {
        let cached = *self.cached.read().await;
        match cached {
            Some(cached) if cached.loaded_at.elapsed() < self.refresh_interval => {
                return Ok(cached.record);
            }
            Some(_) => return self.refresh().await,
            None => {}
        }

        if let Some(record) = self.load_index().await {
            self.remember(record).await;
            return Ok(record);
        }

        self.refresh().await
    }

    /// Rescan the store, replace the cached record and persist it.
    pub async fn refresh(&self) -> Result<BoundsRecord> {
        let record = match self.store.scan_bounds().await? {
            Some(record) => record,
            None => {
                *self.cached.write().await = None;
                return Err(QueryError::NoDataAvailable);
            }
        };

        let previous = self.remember(record).await;
        if previous != Some(record) {
            info!(
                earliest = %record.earliest,
                latest = %record.latest,
                "Bounds index rebuilt from store scan"
            );
        }

        if let Some(path) = &self.index_path {
            if let Err(e) = write_index(path, &record).await {
                warn!(path = %path.display(), error = %e, "Failed to persist bounds index");
            }
        }

        Ok(record)
    }

    /// Last record served, without touching storage.
    pub async fn cached(&self) -> Option<BoundsRecord> {
        self.cached.read().await.map(|c| c.record)
    }

    async fn remember(&self, record: BoundsRecord) -> Option<BoundsRecord> {
        let mut cached = self.cached.write().await;
        let previous = cached.map(|c| c.record);
        *cached = Some(CachedBounds {
            record,
            loaded_at: Instant::now(),
        });
        previous
    }

    /// Read the persisted index; `None` when missing, unreadable or inconsistent.
    async fn load_index(&self) -> Option<BoundsRecord> {
        let path = self.index_path.as_ref()?;
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Bounds index not readable");
                return None;
            }
        };

        let record: BoundsRecord = match serde_json::from_str(&text) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed bounds index");
                return None;
            }
        };

        if record.earliest > record.latest
            || !self.store.exists(record.earliest).await
            || !self.store.exists(record.latest).await
        {
            warn!(
                path = %path.display(),
                earliest = %record.earliest,
                latest = %record.latest,
                "Bounds index inconsistent with store, rescanning"
            );
            return None;
        }

        Some(record)
    }
}

async fn write_index(path: &Path, record: &BoundsRecord) -> std::result::Result<(), StoreError> {
    let body = serde_json::to_vec(record)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
