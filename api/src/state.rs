use std::sync::Arc;

use discos_application::{DiscoRepository, DiscoService};

use crate::openapi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub disco_service: Arc<DiscoService>,
    pub api_docs: Arc<utoipa::openapi::OpenApi>,
}

impl AppState {
    /// Wires the service over `repo`. `port` only feeds the documented server URL.
    pub fn new(repo: Arc<dyn DiscoRepository>, port: u16) -> Self {
        Self {
            disco_service: Arc::new(DiscoService::new(repo)),
            api_docs: Arc::new(openapi::openapi(port)),
        }
    }
}
