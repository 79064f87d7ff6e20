//! OpenAPI definition handlers.

use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::error::ApiError;

/// OpenAPI 3.0 document for the GHRSST API
const OPENAPI_SPEC: &str = include_str!("../openapi.yaml");

/// Path the docs page loads the definition from.
pub const OPENAPI_PATH: &str = "/api/swagger/ghrsst/openapi.json";

/// The embedded OpenAPI document as JSON.
pub fn openapi_document() -> Result<serde_json::Value, ApiError> {
    Ok(serde_yaml::from_str(OPENAPI_SPEC)?)
}

/// GET /api/swagger/ghrsst/openapi.json - OpenAPI definition
pub async fn api_handler() -> Result<Response, ApiError> {
    let document = openapi_document()?;
    Ok((
        [(header::CACHE_CONTROL, "max-age=3600")],
        Json(document),
    )
        .into_response())
}

/// GET /api/swagger/ghrsst - Swagger UI page
pub async fn api_html_handler() -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>GHRSST API Docs</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.ui = SwaggerUIBundle({{ url: '{}', dom_id: '#swagger-ui' }});
    </script>
</body>
</html>"#,
        OPENAPI_PATH
    );

    ([(header::CACHE_CONTROL, "max-age=3600")], Html(html)).into_response()
}
