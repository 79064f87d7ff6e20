//! Request model and validation.
//!
//! [`RawQuery`] mirrors the HTTP parameter set with every value still a
//! string; [`QueryRequest::from_raw`] validates it into a typed point or box
//! request before any grid access happens.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{QueryError, Result};
use crate::fields::FieldSet;
use crate::types::GeoBox;

/// Unvalidated query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    /// Longitude, or box min-lon.
    pub lon0: Option<String>,
    /// Latitude, or box min-lat.
    pub lat0: Option<String>,
    /// Box max-lon; absence selects point mode.
    pub lon1: Option<String>,
    /// Box max-lat; absence selects point mode.
    pub lat1: Option<String>,
    /// Range/day start (YYYY-MM-DD).
    pub start: Option<String>,
    /// Range/day end (YYYY-MM-DD).
    pub end: Option<String>,
    /// Comma-separated field names.
    pub append: Option<String>,
    /// Box stride override.
    pub sample: Option<String>,
    /// Output precision mode.
    pub mode: Option<String>,
}

/// Requested start/end dates, either of which may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSelection {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A selection naming a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: Some(date),
            end: None,
        }
    }

    /// Neither date given.
    pub fn latest() -> Self {
        Self::default()
    }

    /// The day a single-day (box) query reads; `start` wins when both are given.
    pub fn single_day(&self) -> Option<NaiveDate> {
        self.start.or(self.end)
    }
}

/// Output precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Stored values, unmodified.
    #[default]
    Full,
    /// Coordinates rounded to 5 decimals, field values to 3.
    Truncate,
}

impl OutputMode {
    /// Decimal places kept for (coordinates, values), if any rounding applies.
    pub fn precision(&self) -> Option<(i32, i32)> {
        match self {
            OutputMode::Full => None,
            OutputMode::Truncate => Some((5, 3)),
        }
    }

    /// Round a coordinate for output.
    pub fn coord(&self, value: f64) -> f64 {
        match self.precision() {
            Some((digits, _)) => round_to(value, digits),
            None => value,
        }
    }

    /// Round a field value for output.
    pub fn value(&self, value: f64) -> f64 {
        match self.precision() {
            Some((_, digits)) => round_to(value, digits),
            None => value,
        }
    }
}

impl FromStr for OutputMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "full" => Ok(OutputMode::Full),
            "truncate" => Ok(OutputMode::Truncate),
            other => Err(QueryError::invalid_input(format!(
                "Unsupported mode '{}'. Allowed: truncate",
                other
            ))),
        }
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// A single-location request over one day or a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuery {
    pub lon: f64,
    pub lat: f64,
    pub dates: DateSelection,
    pub fields: FieldSet,
    pub mode: OutputMode,
}

/// A single-day request over a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxQuery {
    /// Corners as given; may be unordered.
    pub lon0: f64,
    pub lat0: f64,
    pub lon1: f64,
    pub lat1: f64,
    pub dates: DateSelection,
    pub fields: FieldSet,
    /// Stride override (>= 1).
    pub sample: Option<usize>,
    pub mode: OutputMode,
}

impl BoxQuery {
    /// The box with min/max corners in order.
    pub fn geo_box(&self) -> GeoBox {
        GeoBox::normalized(self.lon0, self.lat0, self.lon1, self.lat1)
    }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    Point(PointQuery),
    Box(BoxQuery),
}

impl QueryRequest {
    /// Validate raw parameters.
    pub fn from_raw(raw: &RawQuery) -> Result<Self> {
        let fields = FieldSet::parse(raw.append.as_deref())?;

        let mode = match raw.mode.as_deref() {
            Some(m) => m.parse::<OutputMode>()?,
            None => OutputMode::Full,
        };

        let lon0 = parse_coord("lon0", raw.lon0.as_deref(), 180.0)?
            .ok_or_else(|| QueryError::invalid_input("Missing required parameter: lon0"))?;
        let lat0 = parse_coord("lat0", raw.lat0.as_deref(), 90.0)?
            .ok_or_else(|| QueryError::invalid_input("Missing required parameter: lat0"))?;
        let lon1 = parse_coord("lon1", raw.lon1.as_deref(), 180.0)?;
        let lat1 = parse_coord("lat1", raw.lat1.as_deref(), 90.0)?;

        let dates = DateSelection::new(
            parse_date(raw.start.as_deref())?,
            parse_date(raw.end.as_deref())?,
        );

        let sample = match raw.sample.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => {
                let n: i64 = s.parse().map_err(|_| {
                    QueryError::invalid_input(format!("Invalid sample '{}': expected integer >= 1", s))
                })?;
                if n < 1 {
                    return Err(QueryError::invalid_input(format!(
                        "Invalid sample {}: expected integer >= 1",
                        n
                    )));
                }
                Some(n as usize)
            }
        };

        match (lon1, lat1) {
            (Some(lon1), Some(lat1)) if !(lon1 == lon0 && lat1 == lat0) => {
                Ok(QueryRequest::Box(BoxQuery {
                    lon0,
                    lat0,
                    lon1,
                    lat1,
                    dates,
                    fields,
                    sample,
                    mode,
                }))
            }
            (Some(_), None) | (None, Some(_)) => Err(QueryError::invalid_input(
                "Box mode requires both lon1 and lat1.",
            )),
            // Absent corners, or a box collapsed onto its first corner.
            _ => Ok(QueryRequest::Point(PointQuery {
                lon: lon0,
                lat: lat0,
                dates,
                fields,
                mode,
            })),
        }
    }

    /// Label for logs and metrics.
    pub fn mode_label(&self) -> &'static str {
        match self {
            QueryRequest::Point(q) if q.dates.start.is_some() && q.dates.end.is_some() => {
                "point-range"
            }
            QueryRequest::Point(_) => "point",
            QueryRequest::Box(_) => "box",
        }
    }
}

fn parse_coord(name: &str, raw: Option<&str>, limit: f64) -> Result<Option<f64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| QueryError::invalid_input(format!("Invalid {} '{}': expected a number", name, raw)))?;
    if !value.is_finite() || value < -limit || value > limit {
        return Err(QueryError::invalid_input(format!(
            "{} {} out of bounds [{}, {}].",
            name, raw, -limit, limit
        )));
    }
    Ok(Some(value))
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(QueryError::invalid_input(
            "Invalid date format. Use YYYY-MM-DD.",
        ));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| QueryError::invalid_input("Invalid date format. Use YYYY-MM-DD."))
}
