//! Error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use grid_query::QueryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON problem body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionResponse {
    /// Machine-readable error kind.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExceptionResponse {
    pub fn new(type_: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("malformed API document: {0}")]
    Document(#[from] serde_yaml::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Query(e) => match e {
                QueryError::InvalidInput(_)
                | QueryError::UnsupportedField { .. }
                | QueryError::DateOutOfRange { .. }
                | QueryError::TooManyPoints { .. } => StatusCode::BAD_REQUEST,
                QueryError::NoDataAvailable => StatusCode::SERVICE_UNAVAILABLE,
                QueryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Encode(_) | ApiError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics and the exception `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Query(e) => e.kind(),
            ApiError::Encode(_) => "encode-error",
            ApiError::Document(_) => "document-error",
        }
    }

    pub fn to_exception(&self) -> ExceptionResponse {
        let status = self.status_code();
        // Internal details stay in the logs.
        let detail = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            "Internal error while reading grid data.".to_string()
        } else {
            self.to_string()
        };
        ExceptionResponse::new(self.kind(), status.as_u16(), detail)
            .with_title(status.canonical_reason().unwrap_or("Error"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "Request rejected");
        }
        crate::metrics::record_error(self.kind());
        error_response(status, self.to_exception())
    }
}

/// Render an exception body with the given status.
pub fn error_response(status: StatusCode, exc: ExceptionResponse) -> Response {
    let json = serde_json::to_string(&exc).unwrap_or_default();
    (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
}
