// ./api/src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use discos_api::{AppState, ServerConfig, StoreKind, router};
use discos_application::DiscoRepository;
use discos_infrastructure::{InMemoryDiscoRepository, SqliteDiscoRepository};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();

    // --- Dependency Injection ---
    let repository: Arc<dyn DiscoRepository> = match config.store {
        StoreKind::Memory => {
            info!("Using the in-memory disco store.");
            Arc::new(InMemoryDiscoRepository::new())
        }
        StoreKind::Sqlite => match SqliteDiscoRepository::open(&config.database_path) {
            Ok(repository) => {
                info!(path = %config.database_path.display(), "Using the SQLite disco store.");
                Arc::new(repository)
            }
            Err(e) => {
                error!("Failed to open the SQLite disco store: {}", e);
                std::process::exit(1);
            }
        },
    };

    let app = router(AppState::new(repository, config.port));
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server running on http://localhost:{}", config.port);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
