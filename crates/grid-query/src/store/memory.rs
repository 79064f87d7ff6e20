//! In-memory snapshot store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{GridAxes, Snapshot, SnapshotStore};
use crate::error::{StoreError, StoreResult};
use crate::fields::Field;
use crate::types::{BoundsRecord, GridWindow};

/// A snapshot held fully in memory; fields are `[lat][lon]` row-major.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    date: NaiveDate,
    axes: GridAxes,
    fields: HashMap<Field, Vec<f32>>,
}

impl MemorySnapshot {
    pub fn new(date: NaiveDate, axes: GridAxes) -> Self {
        Self {
            date,
            axes,
            fields: HashMap::new(),
        }
    }

    /// Attach a field from row-major values.
    pub fn with_field(mut self, field: Field, values: Vec<f32>) -> StoreResult<Self> {
        let (ny, nx) = self.axes.shape();
        if values.len() != ny * nx {
            return Err(StoreError::invalid_metadata(format!(
                "field {} has {} values, grid is {}x{}",
                field,
                values.len(),
                ny,
                nx
            )));
        }
        self.fields.insert(field, values);
        Ok(self)
    }

    /// Attach a field computed per (lat_index, lon_index).
    pub fn with_field_fn(mut self, field: Field, f: impl Fn(usize, usize) -> f32) -> Self {
        let (ny, nx) = self.axes.shape();
        let values = (0..ny)
            .flat_map(|j| (0..nx).map(move |i| (j, i)))
            .map(|(j, i)| f(j, i))
            .collect();
        self.fields.insert(field, values);
        self
    }
}

#[async_trait]
impl Snapshot for MemorySnapshot {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn axes(&self) -> &GridAxes {
        &self.axes
    }

    fn has_field(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    async fn read_window(&self, field: Field, window: &GridWindow) -> StoreResult<Vec<f32>> {
        let values = self.fields.get(&field).ok_or_else(|| {
            StoreError::read_failed(format!("field {} not present on {}", field, self.date))
        })?;
        if !self.axes.contains_window(window) {
            return Err(StoreError::read_failed(format!(
                "window {:?} outside grid {:?}",
                window,
                self.axes.shape()
            )));
        }
        let nx = self.axes.lon().len();
        let mut out = Vec::with_capacity(window.point_count());
        for j in window.lat.indices() {
            for i in window.lon.indices() {
                out.push(values[j * nx + i]);
            }
        }
        Ok(out)
    }
}

/// Snapshot store backed by a map of days.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<BTreeMap<NaiveDate, Arc<MemorySnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_snapshot(mut self, snapshot: MemorySnapshot) -> Self {
        self.snapshots
            .get_mut()
            .insert(snapshot.date, Arc::new(snapshot));
        self
    }

    /// Publish a snapshot.
    pub async fn insert(&self, snapshot: MemorySnapshot) {
        self.snapshots
            .write()
            .await
            .insert(snapshot.date, Arc::new(snapshot));
    }

    /// Withdraw a day.
    pub async fn remove(&self, date: NaiveDate) -> bool {
        self.snapshots.write().await.remove(&date).is_some()
    }

    /// Published days, ascending.
    pub async fn dates(&self) -> Vec<NaiveDate> {
        self.snapshots.read().await.keys().copied().collect()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn exists(&self, date: NaiveDate) -> bool {
        self.snapshots.read().await.contains_key(&date)
    }

    async fn scan_bounds(&self) -> StoreResult<Option<BoundsRecord>> {
        let snapshots = self.snapshots.read().await;
        let (Some(first), Some(last)) = (snapshots.keys().next(), snapshots.keys().next_back())
        else {
            return Ok(None);
        };
        Ok(Some(BoundsRecord {
            earliest: *first,
            latest: *last,
        }))
    }

    async fn open(&self, date: NaiveDate) -> StoreResult<Option<Arc<dyn Snapshot>>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&date)
            .map(|s| s.clone() as Arc<dyn Snapshot>))
    }
}
