//! Zarr V3 filesystem driver.
//!
//! Layout: one group per day at `<root>/YYYY/MM/DD`, holding 1-D coordinate
//! arrays (`lon`/`longitude`, `lat`/`latitude`) and 2-D `[lat, lon]` field
//! arrays named after [`Field::as_str`]. The ingestion process publishes a
//! day by renaming its finished directory into place, so directory existence
//! is the publish signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;
use zarrs_storage::ReadableStorageTraits;

use super::{GridAxes, Snapshot, SnapshotStore};
use crate::error::{StoreError, StoreResult};
use crate::fields::Field;
use crate::types::{BoundsRecord, GridWindow, IndexSpan};

const LON_NAMES: [&str; 2] = ["lon", "longitude"];
const LAT_NAMES: [&str; 2] = ["lat", "latitude"];

/// Snapshot store over a local Zarr V3 hierarchy.
pub struct ZarrSnapshotStore {
    root: PathBuf,
    storage: Arc<FilesystemStore>,
}

impl ZarrSnapshotStore {
    /// Open the store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let storage = FilesystemStore::new(&root)
            .map_err(|e| StoreError::open_failed(format!("{}: {}", root.display(), e)))?;
        Ok(Self {
            root,
            storage: Arc::new(storage),
        })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a day's group.
    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
    }
}

/// Zarr node path of a day's group.
fn group_path(date: NaiveDate) -> String {
    format!("/{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}

#[async_trait]
impl SnapshotStore for ZarrSnapshotStore {
    async fn exists(&self, date: NaiveDate) -> bool {
        tokio::fs::metadata(self.day_dir(date))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn scan_bounds(&self) -> StoreResult<Option<BoundsRecord>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan_day_dirs(&root))
            .await
            .map_err(|e| StoreError::Io(format!("bounds scan task failed: {}", e)))?
    }

    async fn open(&self, date: NaiveDate) -> StoreResult<Option<Arc<dyn Snapshot>>> {
        if !self.exists(date).await {
            return Ok(None);
        }
        let storage = self.storage.clone();
        let day_dir = self.day_dir(date);
        let snapshot = tokio::task::spawn_blocking(move || {
            ZarrSnapshot::open(storage, date, &day_dir)
        })
        .await
        .map_err(|e| StoreError::open_failed(format!("open task failed: {}", e)))??;
        Ok(Some(Arc::new(snapshot)))
    }
}

/// Walk `YYYY/MM/DD` directories and return the first and last valid day.
fn scan_day_dirs(root: &Path) -> StoreResult<Option<BoundsRecord>> {
    if !root.is_dir() {
        warn!(root = %root.display(), "Snapshot root does not exist");
        return Ok(None);
    }

    let mut earliest: Option<NaiveDate> = None;
    let mut latest: Option<NaiveDate> = None;
    let mut days = 0usize;

    for entry in WalkDir::new(root).min_depth(3).max_depth(3) {
        let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(date) = parse_day_path(rel) else {
            continue;
        };
        days += 1;
        earliest = Some(earliest.map_or(date, |e| e.min(date)));
        latest = Some(latest.map_or(date, |l| l.max(date)));
    }

    debug!(root = %root.display(), days, "Scanned snapshot directories");
    Ok(earliest.zip(latest).map(|(earliest, latest)| BoundsRecord { earliest, latest }))
}

/// Parse a relative `YYYY/MM/DD` path into a date.
fn parse_day_path(rel: &Path) -> Option<NaiveDate> {
    let parts: Vec<&str> = rel.iter().filter_map(|c| c.to_str()).collect();
    let [y, m, d] = parts.as_slice() else {
        return None;
    };
    let well_formed = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !(well_formed(y, 4) && well_formed(m, 2) && well_formed(d, 2)) {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// An opened day group.
struct ZarrSnapshot<S: ?Sized> {
    date: NaiveDate,
    axes: GridAxes,
    storage: Arc<S>,
    group: String,
    fields: Vec<Field>,
}

impl<S: ?Sized + ReadableStorageTraits + 'static> ZarrSnapshot<S> {
    fn open(storage: Arc<S>, date: NaiveDate, day_dir: &Path) -> StoreResult<Self> {
        let group = group_path(date);
        let lon = read_coordinate(&storage, &group, &LON_NAMES)?;
        let lat = read_coordinate(&storage, &group, &LAT_NAMES)?;
        let axes = GridAxes::new(lon, lat)?;

        let fields = Field::ALL
            .iter()
            .copied()
            .filter(|f| day_dir.join(f.as_str()).join("zarr.json").is_file())
            .collect();

        Ok(Self {
            date,
            axes,
            storage,
            group,
            fields,
        })
    }
}

#[async_trait]
impl<S: ?Sized + ReadableStorageTraits + Send + Sync + 'static> Snapshot for ZarrSnapshot<S> {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn axes(&self) -> &GridAxes {
        &self.axes
    }

    fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    async fn read_window(&self, field: Field, window: &GridWindow) -> StoreResult<Vec<f32>> {
        if !self.axes.contains_window(window) {
            return Err(StoreError::read_failed(format!(
                "window {:?} outside grid {:?}",
                window,
                self.axes.shape()
            )));
        }
        let storage = self.storage.clone();
        let path = format!("{}/{}", self.group, field.as_str());
        let shape = self.axes.shape();
        let window = *window;
        tokio::task::spawn_blocking(move || read_field_window(storage, &path, shape, &window))
            .await
            .map_err(|e| StoreError::read_failed(format!("read task failed: {}", e)))?
    }
}

/// Read a strided window of a 2-D `[lat, lon]` field array.
///
/// Only chunks holding at least one picked cell are decoded, and only the
/// bounding box of the picked cells inside each of them.
fn read_field_window<S: ?Sized + ReadableStorageTraits + 'static>(
    storage: Arc<S>,
    path: &str,
    (ny, nx): (usize, usize),
    window: &GridWindow,
) -> StoreResult<Vec<f32>> {
    let array = Array::open(storage, path)
        .map_err(|e| StoreError::open_failed(format!("{}: {}", path, e)))?;

    if array.shape() != [ny as u64, nx as u64].as_slice() {
        return Err(StoreError::invalid_metadata(format!(
            "{} has shape {:?}, axes are {}x{}",
            path,
            array.shape(),
            ny,
            nx
        )));
    }

    let chunk_shape = array
        .chunk_grid()
        .chunk_shape(&[0, 0], array.shape())
        .map_err(|e| StoreError::invalid_metadata(e.to_string()))?
        .ok_or_else(|| StoreError::invalid_metadata("missing chunk shape"))?;
    let chunk_h = chunk_shape[0].get() as usize;
    let chunk_w = chunk_shape[1].get() as usize;

    let (out_h, out_w) = window.shape();
    let mut out = vec![f32::NAN; out_h * out_w];

    let mut row0 = window.lat.start - window.lat.start % chunk_h;
    while row0 <= window.lat.end {
        if let Some((r_first, r_last)) = picked_within(&window.lat, row0, row0 + chunk_h) {
            let mut col0 = window.lon.start - window.lon.start % chunk_w;
            while col0 <= window.lon.end {
                if let Some((c_first, c_last)) = picked_within(&window.lon, col0, col0 + chunk_w)
                {
                    let tile_w = c_last - c_first + 1;
                    let subset = ArraySubset::new_with_start_shape(
                        vec![r_first as u64, c_first as u64],
                        vec![(r_last - r_first + 1) as u64, tile_w as u64],
                    )
                    .map_err(|e| StoreError::read_failed(e.to_string()))?;
                    let tile = retrieve_f32(&array, &subset)?;

                    for r in (r_first..=r_last).step_by(window.lat.stride) {
                        let out_row = (r - window.lat.start) / window.lat.stride;
                        for c in (c_first..=c_last).step_by(window.lon.stride) {
                            let out_col = (c - window.lon.start) / window.lon.stride;
                            out[out_row * out_w + out_col] =
                                tile[(r - r_first) * tile_w + (c - c_first)];
                        }
                    }
                }
                col0 += chunk_w;
            }
        }
        row0 += chunk_h;
    }

    Ok(out)
}

/// First and last picked index of `span` inside `[lo, hi)`.
fn picked_within(span: &IndexSpan, lo: usize, hi: usize) -> Option<(usize, usize)> {
    let lo = lo.max(span.start);
    let hi = hi.min(span.last_picked() + 1);
    if lo >= hi {
        return None;
    }
    let first = span.start + (lo - span.start).div_ceil(span.stride) * span.stride;
    if first >= hi {
        return None;
    }
    let last = span.start + ((hi - 1 - span.start) / span.stride) * span.stride;
    Some((first, last))
}

/// Read a 1-D coordinate array under the first name that exists.
fn read_coordinate<S: ?Sized + ReadableStorageTraits + 'static>(
    storage: &Arc<S>,
    group: &str,
    names: &[&str],
) -> StoreResult<Vec<f64>> {
    for name in names {
        let path = format!("{}/{}", group, name);
        let Ok(array) = Array::open(storage.clone(), &path) else {
            continue;
        };
        if array.shape().len() != 1 {
            return Err(StoreError::invalid_metadata(format!(
                "{} must be 1-D, has shape {:?}",
                path,
                array.shape()
            )));
        }
        let subset = ArraySubset::new_with_shape(array.shape().to_vec());
        return match array.data_type() {
            DataType::Float64 => array
                .retrieve_array_subset_elements::<f64>(&subset)
                .map_err(|e| StoreError::read_failed(format!("{}: {}", path, e))),
            DataType::Float32 => array
                .retrieve_array_subset_elements::<f32>(&subset)
                .map(|v| v.into_iter().map(f64::from).collect())
                .map_err(|e| StoreError::read_failed(format!("{}: {}", path, e))),
            other => Err(StoreError::invalid_metadata(format!(
                "{} has unsupported data type {:?}",
                path, other
            ))),
        };
    }
    Err(StoreError::invalid_metadata(format!(
        "{} has no coordinate array named any of {:?}",
        group, names
    )))
}

fn retrieve_f32<S: ?Sized + ReadableStorageTraits + 'static>(
    array: &Array<S>,
    subset: &ArraySubset,
) -> StoreResult<Vec<f32>> {
    match array.data_type() {
        DataType::Float32 => array
            .retrieve_array_subset_elements::<f32>(subset)
            .map_err(|e| StoreError::read_failed(e.to_string())),
        DataType::Float64 => array
            .retrieve_array_subset_elements::<f64>(subset)
            .map(|v| v.into_iter().map(|x| x as f32).collect())
            .map_err(|e| StoreError::read_failed(e.to_string())),
        other => Err(StoreError::invalid_metadata(format!(
            "unsupported field data type {:?}",
            other
        ))),
    }
}
