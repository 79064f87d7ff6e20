//! Common test fixtures for ghrsst-query tests.
//!
//! [`SnapshotFixture`] writes one day's Zarr V3 group the way the ingestion
//! job does: into a staging directory first, then renamed into
//! `<root>/YYYY/MM/DD` so the day appears atomically.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

pub type FixtureResult<T> = Result<T, Box<dyn Error>>;

/// Common bounding boxes as (lon0, lat0, lon1, lat1).
pub mod bbox {
    /// Taiwan Strait, about 240k cells at 0.01 degrees.
    pub const TAIWAN: (f64, f64, f64, f64) = (119.0, 20.0, 123.0, 26.0);

    /// Western Pacific, about 36M cells at 0.01 degrees.
    pub const WEST_PACIFIC: (f64, f64, f64, f64) = (100.0, -30.0, 160.0, 30.0);

    /// TAIWAN with its corners swapped.
    pub const TAIWAN_UNORDERED: (f64, f64, f64, f64) = (123.0, 26.0, 119.0, 20.0);
}

/// Builder for a single day's snapshot on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFixture {
    lon: Vec<f64>,
    lat: Vec<f64>,
    lon_name: String,
    lat_name: String,
    coords_f32: bool,
    chunk: (u64, u64),
    fields: Vec<(String, Vec<f32>)>,
}

impl SnapshotFixture {
    pub fn new(lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self {
            lon,
            lat,
            lon_name: "lon".to_string(),
            lat_name: "lat".to_string(),
            coords_f32: false,
            chunk: (64, 64),
            fields: Vec::new(),
        }
    }

    /// Chunk shape as (lat, lon).
    pub fn chunks(mut self, lat: u64, lon: u64) -> Self {
        self.chunk = (lat, lon);
        self
    }

    /// Name the coordinate arrays, e.g. `("longitude", "latitude")`.
    pub fn coord_names(mut self, lon: &str, lat: &str) -> Self {
        self.lon_name = lon.to_string();
        self.lat_name = lat.to_string();
        self
    }

    /// Store coordinates as float32 instead of float64.
    pub fn coords_f32(mut self) -> Self {
        self.coords_f32 = true;
        self
    }

    /// Add a `[lat, lon]` row-major field.
    pub fn field(mut self, name: &str, values: Vec<f32>) -> Self {
        self.fields.push((name.to_string(), values));
        self
    }

    /// Write and publish the snapshot for `date` under `root`.
    pub fn write(&self, root: &Path, date: NaiveDate) -> FixtureResult<PathBuf> {
        let month_dir = root
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()));
        std::fs::create_dir_all(&month_dir)?;

        let staging = month_dir.join(format!(".{:02}.staging", date.day()));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;
        let store = Arc::new(FilesystemStore::new(&staging)?);

        self.write_coordinate(&store, &self.lon_name, &self.lon)?;
        self.write_coordinate(&store, &self.lat_name, &self.lat)?;

        let (ny, nx) = (self.lat.len() as u64, self.lon.len() as u64);
        for (name, values) in &self.fields {
            if values.len() as u64 != ny * nx {
                return Err(format!(
                    "field {} has {} values, grid is {}x{}",
                    name,
                    values.len(),
                    ny,
                    nx
                )
                .into());
            }
            let array = ArrayBuilder::new(
                vec![ny, nx],
                DataType::Float32,
                vec![self.chunk.0.min(ny), self.chunk.1.min(nx)].try_into()?,
                FillValue::from(f32::NAN),
            )
            .attributes({
                let mut attrs = serde_json::Map::new();
                attrs.insert("long_name".to_string(), serde_json::json!(name));
                attrs
            })
            .build(store.clone(), &format!("/{}", name))?;
            array.store_metadata()?;

            let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![ny, nx])?;
            array.store_array_subset_elements(&subset, values)?;
        }

        let day_dir = month_dir.join(format!("{:02}", date.day()));
        std::fs::rename(&staging, &day_dir)?;
        Ok(day_dir)
    }

    fn write_coordinate(
        &self,
        store: &Arc<FilesystemStore>,
        name: &str,
        values: &[f64],
    ) -> FixtureResult<()> {
        let n = values.len() as u64;
        let subset = ArraySubset::new_with_start_shape(vec![0], vec![n])?;
        if self.coords_f32 {
            let array = ArrayBuilder::new(
                vec![n],
                DataType::Float32,
                vec![n].try_into()?,
                FillValue::from(f32::NAN),
            )
            .build(store.clone(), &format!("/{}", name))?;
            array.store_metadata()?;
            let narrowed: Vec<f32> = values.iter().map(|v| *v as f32).collect();
            array.store_array_subset_elements(&subset, &narrowed)?;
        } else {
            let array = ArrayBuilder::new(
                vec![n],
                DataType::Float64,
                vec![n].try_into()?,
                FillValue::from(f64::NAN),
            )
            .build(store.clone(), &format!("/{}", name))?;
            array.store_metadata()?;
            array.store_array_subset_elements(&subset, values)?;
        }
        Ok(())
    }
}

/// Write a bounds index file (`{"earliest": ..., "latest": ...}`).
pub fn write_bounds_index(path: &Path, earliest: NaiveDate, latest: NaiveDate) -> FixtureResult<()> {
    let body = serde_json::json!({
        "earliest": earliest.format("%Y-%m-%d").to_string(),
        "latest": latest.format("%Y-%m-%d").to_string(),
    });
    std::fs::write(path, serde_json::to_vec(&body)?)?;
    Ok(())
}

/// Create a temporary store root.
pub fn temp_store() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("ghrsst-store-")
        .tempdir()
        .expect("Failed to create temporary store directory")
}
