//! `OpenAPI` document generated from the handler annotations.

use discos_application::{DiscoPatchRequest, DiscoRequest, DiscoResponse, MessageResponse};
use utoipa::OpenApi;
use utoipa::openapi::server::Server;

/// `OpenAPI` documentation for the discos REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Discos CRUD API",
        version = env!("CARGO_PKG_VERSION"),
        description = "A simple CRUD API for discos, backed by a volatile or a persistent store"
    ),
    paths(
        crate::routes::docs::get_api_docs,
        crate::routes::docs::get_openapi_json,
        crate::routes::discos::list_discos,
        crate::routes::discos::get_disco,
        crate::routes::discos::create_disco,
        crate::routes::discos::replace_disco,
        crate::routes::discos::update_disco,
        crate::routes::discos::delete_disco,
    ),
    components(
        schemas(
            DiscoResponse,
            DiscoRequest,
            DiscoPatchRequest,
            MessageResponse,
        )
    ),
    tags(
        (name = "discos", description = "The discos managing API"),
        (name = "docs", description = "API documentation"),
    ),
)]
pub struct ApiDoc;

/// Returns the generated spec, advertising `http://localhost:{port}` as server.
#[must_use]
pub fn openapi(port: u16) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
    spec
}
