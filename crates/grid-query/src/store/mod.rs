//! Grid-store contract.
//!
//! The engine never touches storage directly: it asks a [`SnapshotStore`] for
//! the snapshot of a given day and reads field windows through the returned
//! [`Snapshot`] handle. [`ZarrSnapshotStore`] is the production driver,
//! [`MemorySnapshotStore`] an in-memory double for tests.

mod memory;
mod zarr;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{StoreError, StoreResult};
use crate::fields::Field;
use crate::types::{BoundsRecord, GridWindow};

pub use memory::{MemorySnapshot, MemorySnapshotStore};
pub use zarr::ZarrSnapshotStore;

/// Sorted coordinate axes of a snapshot grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    lon: Vec<f64>,
    lat: Vec<f64>,
}

impl GridAxes {
    /// Create axes, rejecting empty, non-finite or non-ascending values.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>) -> StoreResult<Self> {
        check_axis("lon", &lon)?;
        check_axis("lat", &lat)?;
        Ok(Self { lon, lat })
    }

    /// Longitude values, ascending.
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Latitude values, ascending.
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// (first, last) longitude.
    pub fn lon_range(&self) -> (f64, f64) {
        (self.lon[0], self.lon[self.lon.len() - 1])
    }

    /// (first, last) latitude.
    pub fn lat_range(&self) -> (f64, f64) {
        (self.lat[0], self.lat[self.lat.len() - 1])
    }

    /// Grid shape as (lat, lon).
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Whether indices resolved against `other` address the same cells here.
    pub fn same_grid(&self, other: &GridAxes) -> bool {
        self.shape() == other.shape()
            && self.lon_range() == other.lon_range()
            && self.lat_range() == other.lat_range()
    }

    /// Whether a window lies fully inside the grid.
    pub fn contains_window(&self, window: &GridWindow) -> bool {
        window.lat.end < self.lat.len() && window.lon.end < self.lon.len()
    }
}

fn check_axis(name: &str, values: &[f64]) -> StoreResult<()> {
    if values.is_empty() {
        return Err(StoreError::invalid_metadata(format!("{} axis is empty", name)));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(StoreError::invalid_metadata(format!(
            "{} axis has non-finite value at index {}",
            name, i
        )));
    }
    if let Some(i) = values.windows(2).position(|w| w[0] >= w[1]) {
        return Err(StoreError::invalid_metadata(format!(
            "{} axis is not strictly ascending at index {}",
            name,
            i + 1
        )));
    }
    Ok(())
}

/// One published daily snapshot.
#[async_trait]
pub trait Snapshot: Send + Sync {
    /// Calendar day of this snapshot.
    fn date(&self) -> NaiveDate;

    /// Coordinate axes.
    fn axes(&self) -> &GridAxes;

    /// Whether the snapshot stores `field`.
    fn has_field(&self, field: Field) -> bool;

    /// Read a strided window of `field`.
    ///
    /// Values come back row-major (latitude outer, longitude inner, both
    /// ascending) with NaN for missing data.
    async fn read_window(&self, field: Field, window: &GridWindow) -> StoreResult<Vec<f32>>;
}

/// Driver over the set of daily snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Whether the snapshot for `date` is published. Metadata lookup only.
    async fn exists(&self, date: NaiveDate) -> bool;

    /// Earliest and latest published days, or `None` for an empty store.
    async fn scan_bounds(&self) -> StoreResult<Option<BoundsRecord>>;

    /// Open the snapshot for `date`; `Ok(None)` when the day is absent.
    async fn open(&self, date: NaiveDate) -> StoreResult<Option<Arc<dyn Snapshot>>>;
}
