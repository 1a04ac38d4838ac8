//! Serves the generated `OpenAPI` document and a Swagger UI page over it.

use axum::{
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Response},
};
use discos_application::{ApplicationError, MessageResponse};

use crate::error::map_application_error_to_response;
use crate::state::AppState;

/// Where the Swagger UI page loads the document from.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

const SWAGGER_UI: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Discos CRUD API</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        body {
            margin: 0;
            background: #fafafa;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: '/api-docs/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;

/// Returns the `OpenAPI` document, or the Swagger UI page when the client asks for HTML.
#[utoipa::path(
    get,
    path = "/api-docs",
    tag = "docs",
    responses(
        (
            status = 200,
            description = "OpenAPI document for the discos API, or Swagger UI for browsers",
            body = String,
            content_type = "application/json"
        ),
        (status = 500, description = "Internal error", body = MessageResponse),
    )
)]
pub(crate) async fn get_api_docs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if wants_html(&headers) {
        return Html(SWAGGER_UI).into_response();
    }
    openapi_json(&state)
}

/// Returns the `OpenAPI` document as JSON.
#[utoipa::path(
    get,
    path = "/api-docs/openapi.json",
    tag = "docs",
    responses(
        (
            status = 200,
            description = "OpenAPI document for the discos API",
            body = String,
            content_type = "application/json"
        ),
        (status = 500, description = "Internal error", body = MessageResponse),
    )
)]
pub(crate) async fn get_openapi_json(State(state): State<AppState>) -> Response {
    openapi_json(&state)
}

fn openapi_json(state: &AppState) -> Response {
    match serde_json::to_string_pretty(state.api_docs.as_ref()) {
        Ok(spec) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], spec).into_response(),
        Err(err) => map_application_error_to_response(ApplicationError::InfrastructureError(
            format!("failed to serialize OpenAPI document: {err}"),
        )),
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
