//! Bounds handler.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use grid_query::BoundsRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/ghrsst/bounds - Earliest and latest available days
pub async fn bounds_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<BoundsRecord>, ApiError> {
    Ok(Json(state.bounds.get_bounds().await?))
}
