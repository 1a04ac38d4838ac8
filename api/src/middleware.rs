use axum::{
    Json,
    extract::{Path, Request, State, rejection::PathRejection},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use discos_application::{ApplicationError, MessageResponse};
use tracing::debug;

use crate::error::map_application_error_to_response;
use crate::state::AppState;

/// Record Lookup Middleware for `/discos/:id`.
///
/// Resolves the path identifier and stores the `Disco` in the request
/// extensions for the handler. Unknown ids short-circuit with 404; malformed
/// ids and storage faults with 500. An undecodable path segment is a 400.
pub async fn lookup_disco(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => {
            return map_application_error_to_response(ApplicationError::InvalidInput(
                rejection.body_text(),
            ));
        }
    };

    match state.disco_service.find_disco(&id).await {
        Ok(disco) => {
            debug!(disco_id = %id, "Disco resolved");
            request.extensions_mut().insert(disco);
            next.run(request).await
        }
        Err(e) => map_application_error_to_response(e),
    }
}

/// Gives framework-generated error responses (405, 415, ...) the same
/// `{"message": ...}` body as every other error.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error()) || is_json {
        return response;
    }

    let message = status.canonical_reason().unwrap_or("Request failed");
    debug!(%status, "Rewriting plain error response as JSON");
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(CONTENT_LENGTH);
    (parts, Json(MessageResponse::new(message))).into_response()
}
