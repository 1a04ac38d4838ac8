//! Resource handlers for `/discos`.
//!
//! Handlers under `/discos/:id` run behind [`crate::middleware::lookup_disco`]
//! and receive the resolved record through `Extension<Disco>`.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use discos_application::{DiscoPatchRequest, DiscoRequest, DiscoResponse, MessageResponse};
use discos_domain::Disco;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{json_object, map_application_error_to_response};
use crate::state::AppState;

type JsonObject = Result<Json<Map<String, Value>>, JsonRejection>;

/// Returns the list of all the discos.
#[utoipa::path(
    get,
    path = "/discos",
    tag = "discos",
    responses(
        (status = 200, description = "The list of the discos", body = [DiscoResponse]),
        (status = 500, description = "Some server error", body = MessageResponse),
    )
)]
pub(crate) async fn list_discos(State(state): State<AppState>) -> Response {
    info!("Received request to list discos");
    match state.disco_service.list_discos().await {
        Ok(discos) => {
            let body: Vec<DiscoResponse> = discos.into_iter().map(DiscoResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Failed to list discos via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Get the disco by id.
#[utoipa::path(
    get,
    path = "/discos/{id}",
    tag = "discos",
    params(
        ("id" = String, Path, description = "The disco id")
    ),
    responses(
        (status = 200, description = "The disco description by id", body = DiscoResponse),
        (status = 404, description = "The disco was not found", body = MessageResponse),
        (status = 500, description = "Malformed id or server error", body = MessageResponse),
    )
)]
pub(crate) async fn get_disco(Extension(disco): Extension<Disco>) -> Response {
    (StatusCode::OK, Json(DiscoResponse::from(disco))).into_response()
}

/// Create a new disco.
#[utoipa::path(
    post,
    path = "/discos",
    tag = "discos",
    request_body = DiscoRequest,
    responses(
        (status = 201, description = "The disco was successfully created", body = DiscoResponse),
        (status = 400, description = "Invalid payload", body = MessageResponse),
        (status = 500, description = "Some server error", body = MessageResponse),
    )
)]
pub(crate) async fn create_disco(State(state): State<AppState>, payload: JsonObject) -> Response {
    info!("Received request to create disco");
    let payload = match json_object(payload) {
        Ok(payload) => payload,
        Err(e) => return map_application_error_to_response(e),
    };

    match state.disco_service.create_disco(&payload).await {
        Ok(disco) => (StatusCode::CREATED, Json(DiscoResponse::from(disco))).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Replace every field of the disco by the id.
#[utoipa::path(
    put,
    path = "/discos/{id}",
    tag = "discos",
    params(
        ("id" = String, Path, description = "The disco id")
    ),
    request_body = DiscoRequest,
    responses(
        (status = 200, description = "The disco was replaced", body = DiscoResponse),
        (status = 400, description = "Invalid payload", body = MessageResponse),
        (status = 404, description = "The disco was not found", body = MessageResponse),
        (status = 500, description = "Some error happened", body = MessageResponse),
    )
)]
pub(crate) async fn replace_disco(
    State(state): State<AppState>,
    Extension(disco): Extension<Disco>,
    payload: JsonObject,
) -> Response {
    info!(disco_id = %disco.id(), "Received request to replace disco");
    let payload = match json_object(payload) {
        Ok(payload) => payload,
        Err(e) => return map_application_error_to_response(e),
    };

    match state.disco_service.replace_disco(&disco, &payload).await {
        Ok(updated) => (StatusCode::OK, Json(DiscoResponse::from(updated))).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Update the disco by the id. Only present, non-null fields are changed.
#[utoipa::path(
    patch,
    path = "/discos/{id}",
    tag = "discos",
    params(
        ("id" = String, Path, description = "The disco id")
    ),
    request_body = DiscoPatchRequest,
    responses(
        (status = 200, description = "The disco was updated", body = DiscoResponse),
        (status = 400, description = "Invalid payload", body = MessageResponse),
        (status = 404, description = "The disco was not found", body = MessageResponse),
        (status = 500, description = "Some error happened", body = MessageResponse),
    )
)]
pub(crate) async fn update_disco(
    State(state): State<AppState>,
    Extension(disco): Extension<Disco>,
    payload: JsonObject,
) -> Response {
    info!(disco_id = %disco.id(), "Received request to update disco");
    let payload = match json_object(payload) {
        Ok(payload) => payload,
        Err(e) => return map_application_error_to_response(e),
    };

    match state.disco_service.update_disco(&disco, &payload).await {
        Ok(updated) => (StatusCode::OK, Json(DiscoResponse::from(updated))).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Remove the disco by id.
#[utoipa::path(
    delete,
    path = "/discos/{id}",
    tag = "discos",
    params(
        ("id" = String, Path, description = "The disco id")
    ),
    responses(
        (status = 200, description = "The disco was deleted", body = MessageResponse),
        (status = 404, description = "The disco was not found", body = MessageResponse),
        (status = 500, description = "Some error happened", body = MessageResponse),
    )
)]
pub(crate) async fn delete_disco(
    State(state): State<AppState>,
    Extension(disco): Extension<Disco>,
) -> Response {
    info!(disco_id = %disco.id(), "Received request to delete disco");
    match state.disco_service.delete_disco(&disco).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Deleted Disco"))).into_response(),
        Err(e) => {
            error!(disco_id = %disco.id(), "Failed to delete disco via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}
