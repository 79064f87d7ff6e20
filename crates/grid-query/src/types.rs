//! Core types for query resolution.

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{QueryError, Result};
use crate::fields::Field;

/// Inclusive date range for which snapshots may exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsRecord {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl BoundsRecord {
    /// Create a bounds record, rejecting `earliest > latest`.
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Result<Self> {
        if earliest > latest {
            return Err(QueryError::invalid_input(format!(
                "bounds earliest {} is after latest {}",
                earliest, latest
            )));
        }
        Ok(Self { earliest, latest })
    }

    /// Check if a date falls inside the bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }

    /// Number of calendar days covered (inclusive).
    pub fn span_days(&self) -> i64 {
        (self.latest - self.earliest).num_days() + 1
    }
}

/// A resolved (lon, lat) index pair into a snapshot's axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub lon_index: usize,
    pub lat_index: usize,
}

impl GridIndex {
    pub fn new(lon_index: usize, lat_index: usize) -> Self {
        Self {
            lon_index,
            lat_index,
        }
    }
}

/// A geographic box in decimal degrees, always stored min-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBox {
    /// Build a box from two unordered corners.
    pub fn normalized(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Self {
        Self {
            min_lon: lon0.min(lon1),
            min_lat: lat0.min(lat1),
            max_lon: lon0.max(lon1),
            max_lat: lat0.max(lat1),
        }
    }

    /// Width in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Clamp the box onto an axis extent.
    pub fn clamp_to(&self, lon_range: (f64, f64), lat_range: (f64, f64)) -> Self {
        Self {
            min_lon: self.min_lon.clamp(lon_range.0, lon_range.1),
            min_lat: self.min_lat.clamp(lat_range.0, lat_range.1),
            max_lon: self.max_lon.clamp(lon_range.0, lon_range.1),
            max_lat: self.max_lat.clamp(lat_range.0, lat_range.1),
        }
    }
}

/// Inclusive, strided span of indices along one axis.
///
/// Picks are `start, start + stride, ...` up to and including `end` when it
/// falls on the stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpan {
    pub start: usize,
    pub end: usize,
    pub stride: usize,
}

impl IndexSpan {
    /// Create a span; `start`/`end` are reordered and the stride floored at 1.
    pub fn new(start: usize, end: usize, stride: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            stride: stride.max(1),
        }
    }

    /// A span selecting exactly one index.
    pub fn single(index: usize) -> Self {
        Self::new(index, index, 1)
    }

    /// Number of picked indices: `floor((end - start) / stride) + 1`.
    pub fn picked_count(&self) -> usize {
        (self.end - self.start) / self.stride + 1
    }

    /// Last picked index (may be below `end`).
    pub fn last_picked(&self) -> usize {
        self.start + (self.picked_count() - 1) * self.stride
    }

    /// Iterate over picked indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (self.start..=self.end).step_by(self.stride)
    }

    /// Position of `index` in the picked sequence, if it is picked.
    pub fn position_of(&self, index: usize) -> Option<usize> {
        if index < self.start || index > self.end {
            return None;
        }
        let offset = index - self.start;
        (offset % self.stride == 0).then_some(offset / self.stride)
    }
}

/// A strided sub-grid selection over (lat, lon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub lat: IndexSpan,
    pub lon: IndexSpan,
}

impl GridWindow {
    pub fn new(lat: IndexSpan, lon: IndexSpan) -> Self {
        Self { lat, lon }
    }

    /// Window covering a single grid cell.
    pub fn cell(index: GridIndex) -> Self {
        Self {
            lat: IndexSpan::single(index.lat_index),
            lon: IndexSpan::single(index.lon_index),
        }
    }

    /// Picked (lat rows, lon columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.picked_count(), self.lon.picked_count())
    }

    /// Total number of picked grid points.
    pub fn point_count(&self) -> usize {
        self.lat.picked_count() * self.lon.picked_count()
    }
}

/// One field's value at a grid point; `None` for missing data.
pub type FieldValue = Option<f64>;

/// A single output row: one grid point on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub lon: f64,
    pub lat: f64,
    pub date: NaiveDate,
    /// Requested fields in request order; `None` renders as null.
    pub values: Vec<(Field, FieldValue)>,
}

impl ResultRow {
    /// Look up a field value.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| *v)
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.values.len()))?;
        map.serialize_entry("lon", &self.lon)?;
        map.serialize_entry("lat", &self.lat)?;
        map.serialize_entry("date", &self.date)?;
        for (field, value) in &self.values {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// Output of a resolved query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: Vec<ResultRow>,
    /// Effective stride (box mode only).
    pub stride: Option<usize>,
    pub row_count: usize,
}

impl QueryResult {
    /// Result for point mode.
    pub fn points(rows: Vec<ResultRow>) -> Self {
        let row_count = rows.len();
        Self {
            rows,
            stride: None,
            row_count,
        }
    }

    /// Result for box mode.
    pub fn sub_grid(rows: Vec<ResultRow>, stride: usize) -> Self {
        let row_count = rows.len();
        Self {
            rows,
            stride: Some(stride),
            row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bounds_record_rejects_inverted_range() {
        assert!(BoundsRecord::new(day(2025, 11, 2), day(2025, 10, 27)).is_err());
        let b = BoundsRecord::new(day(2025, 10, 27), day(2025, 11, 2)).unwrap();
        assert!(b.contains(day(2025, 10, 30)));
        assert!(!b.contains(day(2025, 11, 3)));
        assert_eq!(b.span_days(), 7);
    }

    #[test]
    fn test_bounds_record_json() {
        let b = BoundsRecord::new(day(2024, 5, 1), day(2024, 5, 3)).unwrap();
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"{"earliest":"2024-05-01","latest":"2024-05-03"}"#);
        let back: BoundsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_geobox_normalized() {
        let a = GeoBox::normalized(123.0, 26.0, 119.0, 20.0);
        let b = GeoBox::normalized(119.0, 20.0, 123.0, 26.0);
        assert_eq!(a, b);
        assert_eq!(a.min_lon, 119.0);
        assert_eq!(a.max_lat, 26.0);
    }

    #[test]
    fn test_index_span_picked_count() {
        let span = IndexSpan::new(10, 13, 2);
        assert_eq!(span.picked_count(), 2);
        assert_eq!(span.indices().collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(span.last_picked(), 12);

        for (start, end, stride) in [(0, 0, 1), (0, 9, 3), (5, 100, 7), (3, 4, 10)] {
            let span = IndexSpan::new(start, end, stride);
            assert_eq!(span.picked_count(), (end - start) / stride + 1);
            assert_eq!(span.indices().count(), span.picked_count());
        }
    }

    #[test]
    fn test_index_span_position_of() {
        let span = IndexSpan::new(10, 20, 3);
        assert_eq!(span.position_of(10), Some(0));
        assert_eq!(span.position_of(16), Some(2));
        assert_eq!(span.position_of(17), None);
        assert_eq!(span.position_of(9), None);
        assert_eq!(span.position_of(21), None);
    }

    #[test]
    fn test_grid_window_point_count() {
        let w = GridWindow::new(IndexSpan::new(0, 600, 1), IndexSpan::new(0, 400, 1));
        assert_eq!(w.point_count(), 601 * 401);
        assert_eq!(GridWindow::cell(GridIndex::new(4, 7)).point_count(), 1);
    }

    #[test]
    fn test_result_row_serialization_order_and_nulls() {
        let row = ResultRow {
            lon: 135.0,
            lat: 15.0,
            date: day(2025, 10, 30),
            values: vec![(Field::SstAnomaly, None), (Field::Sst, Some(20.5))],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"lon":135.0,"lat":15.0,"date":"2025-10-30","sst_anomaly":null,"sst":20.5}"#
        );
        assert_eq!(row.get(Field::Sst), Some(Some(20.5)));
        assert_eq!(row.get(Field::SeaIce), None);
    }
}
