//! Error types for query resolution.
//!
//! [`QueryError`] is the client-facing taxonomy: every variant except
//! [`QueryError::Storage`] means the request must change before a retry can
//! succeed. [`StoreError`] belongs to the grid-store driver underneath.

use thiserror::Error;

use crate::types::BoundsRecord;

/// Errors raised by the grid-store driver.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open a snapshot or one of its arrays.
    #[error("failed to open snapshot: {0}")]
    OpenFailed(String),

    /// Failed to read data from a snapshot array.
    #[error("failed to read grid data: {0}")]
    ReadFailed(String),

    /// Snapshot metadata is malformed (unsorted axis, wrong rank, ...).
    #[error("invalid grid metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Filesystem error.
    #[error("storage I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a Zarr error.
    pub fn zarr(msg: impl Into<String>) -> Self {
        Self::Zarr(msg.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Errors returned to clients of the query engine.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed or out-of-range request parameter.
    #[error("{0}")]
    InvalidInput(String),

    /// One or more requested fields are not served.
    #[error("Unsupported field(s): {}. Allowed: {}", .offenders.join(","), .allowed.join(","))]
    UnsupportedField {
        offenders: Vec<String>,
        allowed: Vec<String>,
    },

    /// The requested date(s) have no snapshot within the available bounds.
    #[error(
        "Data not exist for requested date(s); available date range is {}/{}.",
        .bounds.earliest, .bounds.latest
    )]
    DateOutOfRange { bounds: BoundsRecord },

    /// A box request stays above the point ceiling after stride escalation.
    #[error("Too many points ({count}). Increase 'sample' or shrink bbox (limit {limit}).")]
    TooManyPoints { count: usize, limit: usize },

    /// The store holds no snapshots at all.
    #[error("No available dates.")]
    NoDataAvailable,

    /// Failure below the engine (I/O, corrupt arrays).
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl QueryError {
    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for the client-facing taxonomy, false for storage failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// Short machine-readable label, used for metrics and exception types.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid-input",
            Self::UnsupportedField { .. } => "unsupported-field",
            Self::DateOutOfRange { .. } => "date-out-of-range",
            Self::TooManyPoints { .. } => "too-many-points",
            Self::NoDataAvailable => "no-data-available",
            Self::Storage(_) => "storage-error",
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Result type for grid-store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_date_out_of_range_names_bounds() {
        let bounds = BoundsRecord::new(
            NaiveDate::from_ymd_opt(2002, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
        )
        .unwrap();
        let err = QueryError::DateOutOfRange { bounds };
        let msg = err.to_string();
        assert!(msg.contains("2002-06-01/2025-11-02"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_unsupported_field_lists_offenders_and_allowed() {
        let err = QueryError::UnsupportedField {
            offenders: vec!["chl".to_string(), "wind".to_string()],
            allowed: vec!["sst".to_string(), "sea_ice".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported field(s): chl,wind. Allowed: sst,sea_ice"
        );
    }

    #[test]
    fn test_too_many_points_message() {
        let err = QueryError::TooManyPoints {
            count: 2_253_001,
            limit: 1_000_000,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Too many points"));
        assert!(msg.contains("2253001"));
        assert!(msg.contains("1000000"));
    }

    #[test]
    fn test_storage_error_is_not_client_error() {
        let err: QueryError = StoreError::read_failed("chunk decode").into();
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "storage-error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
