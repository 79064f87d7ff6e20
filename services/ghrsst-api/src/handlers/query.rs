//! Point and box query handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use grid_query::{QueryRequest, QueryResult, RawQuery};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Header carrying the effective box stride.
pub const X_STRIDE: &str = "x-stride";

/// Header carrying the number of rows in a box response.
pub const X_SERVED_ROWS: &str = "x-served-rows";

/// GET /api/ghrsst
///
/// `lon0`/`lat0` select a point; adding `lon1`/`lat1` selects a box.
pub async fn query_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RawQuery>,
) -> Result<Response, ApiError> {
    let started = Instant::now();

    let request = QueryRequest::from_raw(&params)?;
    let mode = request.mode_label();
    metrics::record_request(mode);
    tracing::debug!(mode, ?request, "Query accepted");

    let result = state.engine.resolve(&request).await?;
    let response = rows_response(&result)?;

    metrics::record_served(result.row_count, started.elapsed().as_secs_f64() * 1000.0);
    Ok(response)
}

/// JSON array of rows; box results also carry stride and row-count headers.
fn rows_response(result: &QueryResult) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(&result.rows)?;
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response();

    if let Some(stride) = result.stride {
        let headers = response.headers_mut();
        headers.insert(X_STRIDE, HeaderValue::from(stride));
        headers.insert(X_SERVED_ROWS, HeaderValue::from(result.row_count));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grid_query::{Field, ResultRow};

    fn row(lon: f64) -> ResultRow {
        ResultRow {
            lon,
            lat: 20.0,
            date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
            values: vec![(Field::Sst, Some(25.0))],
        }
    }

    #[test]
    fn test_box_headers() {
        let response = rows_response(&QueryResult::sub_grid(vec![row(1.0), row(2.0)], 4)).unwrap();
        assert_eq!(response.headers()[X_STRIDE], "4");
        assert_eq!(response.headers()[X_SERVED_ROWS], "2");
    }

    #[test]
    fn test_point_has_no_box_headers() {
        let response = rows_response(&QueryResult::points(vec![row(1.0)])).unwrap();
        assert!(response.headers().get(X_STRIDE).is_none());
        assert!(response.headers().get(X_SERVED_ROWS).is_none());
    }
}
