//! HTTP surface of the discos service: router, lookup middleware, handlers
//! and the generated OpenAPI document.

pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use config::{ServerConfig, StoreKind};
pub use routes::router;
pub use state::AppState;
