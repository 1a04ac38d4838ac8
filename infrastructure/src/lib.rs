// Module declarations
pub mod persistence;

// Re-export both store implementations
pub use persistence::{InMemoryDiscoRepository, SqliteDiscoRepository};
