use axum::{
    Json, Router,
    http::StatusCode,
    middleware::{from_fn_with_state, map_response},
    response::IntoResponse,
    routing::get,
};
use discos_application::MessageResponse;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::{json_error_body, lookup_disco};
use crate::state::AppState;

pub mod discos;
pub mod docs;

/// Builds the full router over `state`.
pub fn router(state: AppState) -> Router {
    // Every method on a single disco resolves the record first.
    let disco_by_id = Router::new()
        .route(
            "/discos/:id",
            get(discos::get_disco)
                .put(discos::replace_disco)
                .patch(discos::update_disco)
                .delete(discos::delete_disco),
        )
        .route_layer(from_fn_with_state(state.clone(), lookup_disco));

    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs", get(docs::get_api_docs))
        .route("/api-docs/openapi.json", get(docs::get_openapi_json))
        .route(
            "/discos",
            get(discos::list_discos).post(discos::create_disco),
        )
        .merge(disco_by_id)
        .fallback(route_not_found)
        .layer(map_response(json_error_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}
