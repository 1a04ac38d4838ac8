use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use discos_application::{ApplicationError, MessageResponse};
use serde_json::{Map, Value};
use tracing::{error, warn};

/// Message returned whenever an identifier does not resolve.
pub const NOT_FOUND_MESSAGE: &str = "Cannot find disco";

/// Unwraps a JSON object body, turning any rejection into a client error.
pub fn json_object(
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Map<String, Value>, ApplicationError> {
    payload
        .map(|Json(object)| object)
        .map_err(|rejection| ApplicationError::InvalidInput(rejection.body_text()))
}

/// Maps ApplicationError to an HTTP status code and a `{"message": ...}` body.
pub fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, message) = match err {
        ApplicationError::InvalidInput(msg) => {
            warn!("Rejected request body: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        ApplicationError::DomainError(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            (StatusCode::BAD_REQUEST, domain_err.to_string())
        }
        ApplicationError::NotFound(id) => {
            warn!(disco_id = %id, "Disco not found");
            (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
        }
        ApplicationError::MalformedId(id) => {
            error!(disco_id = %id, "Identifier rejected by the store");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Malformed disco id '{}'", id),
            )
        }
        ApplicationError::InfrastructureError(msg) => {
            error!("Underlying infrastructure error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    };
    (status, Json(MessageResponse::new(message))).into_response()
}
