//! SQLite-backed persistent disco store.
//!
//! Discos are kept as JSON documents keyed by a store-assigned UUIDv7. The
//! `seq` column only records insertion order for listing.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use discos_application::{ApplicationError, DiscoRepository};
use discos_domain::{Disco, DiscoFields, DiscoId, DiscoPatch};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS discos (
        seq      INTEGER PRIMARY KEY AUTOINCREMENT,
        id       TEXT NOT NULL UNIQUE,
        document TEXT NOT NULL
    );
";

/// Persistent store; survives process restarts when opened on a file.
#[derive(Debug, Clone)]
pub struct SqliteDiscoRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDiscoRepository {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| storage_error(&format!("open {}", path.display()), e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| storage_error("configure database", e))?;
        info!(path = %path.display(), "Opened SQLite disco store");
        Self::initialize(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApplicationError> {
        let conn =
            Connection::open_in_memory().map_err(|e| storage_error("open in-memory", e))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, ApplicationError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| storage_error("create schema", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a blocking statement off the async executor.
    async fn with_connection<T, F>(
        &self,
        operation: &'static str,
        f: F,
    ) -> Result<T, ApplicationError>
    where
        F: FnOnce(&Connection) -> Result<T, ApplicationError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                ApplicationError::InfrastructureError(format!(
                    "SQLite connection lock poisoned during {operation}"
                ))
            })?;
            f(&*guard)
        })
        .await
        .map_err(|e| storage_error(operation, e))?
    }
}

fn storage_error(context: &str, err: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::InfrastructureError(format!("SQLite {context} failed: {err}"))
}

/// Row key for an id. Only the lowercase hyphenated UUID form is accepted,
/// so braced, URN or uppercase spellings never alias a stored disco.
fn parse_id(id: &DiscoId) -> Result<String, ApplicationError> {
    Uuid::parse_str(id.as_str())
        .ok()
        .map(|uuid| uuid.to_string())
        .filter(|key| key == id.as_str())
        .ok_or_else(|| ApplicationError::MalformedId(id.to_string()))
}

fn decode(id: String, document: &str) -> Result<Disco, ApplicationError> {
    let fields: DiscoFields =
        serde_json::from_str(document).map_err(|e| storage_error("decode document", e))?;
    Ok(Disco::new(DiscoId::new(id), fields))
}

fn encode(fields: &DiscoFields) -> Result<String, ApplicationError> {
    serde_json::to_string(fields).map_err(|e| storage_error("encode document", e))
}

#[async_trait]
impl DiscoRepository for SqliteDiscoRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Disco>, ApplicationError> {
        debug!("Listing discos from SQLite store");
        self.with_connection("list", |conn| {
            let mut stmt = conn
                .prepare("SELECT id, document FROM discos ORDER BY seq")
                .map_err(|e| storage_error("prepare list", e))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(|e| storage_error("list", e))?;

            let mut discos = Vec::new();
            for row in rows {
                let (id, document) = row.map_err(|e| storage_error("read row", e))?;
                discos.push(decode(id, &document)?);
            }
            Ok(discos)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &DiscoId) -> Result<Option<Disco>, ApplicationError> {
        debug!(disco_id = %id, "Getting disco from SQLite store");
        let key = parse_id(id)?;
        self.with_connection("get", move |conn| {
            let document: Option<String> = conn
                .query_row(
                    "SELECT document FROM discos WHERE id = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| storage_error("get", e))?;
            document.map(|document| decode(key, &document)).transpose()
        })
        .await
    }

    #[instrument(skip(self, fields))]
    async fn insert(&self, fields: &DiscoFields) -> Result<Disco, ApplicationError> {
        let disco = Disco::new(DiscoId::new(Uuid::now_v7().to_string()), fields.clone());
        debug!(disco_id = %disco.id(), "Inserting disco into SQLite store");
        let document = encode(disco.fields())?;
        let key = disco.id().to_string();
        self.with_connection("insert", move |conn| {
            conn.execute(
                "INSERT INTO discos (id, document) VALUES (?1, ?2)",
                params![key, document],
            )
            .map_err(|e| storage_error("insert", e))?;
            Ok(())
        })
        .await?;
        Ok(disco)
    }

    #[instrument(skip(self, disco), fields(disco_id = %disco.id()))]
    async fn replace(&self, disco: &Disco) -> Result<bool, ApplicationError> {
        debug!("Replacing disco in SQLite store");
        let key = parse_id(disco.id())?;
        let document = encode(disco.fields())?;
        self.with_connection("replace", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE discos SET document = ?2 WHERE id = ?1",
                    params![key, document],
                )
                .map_err(|e| storage_error("replace", e))?;
            Ok(changed > 0)
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: &DiscoId,
        patch: &DiscoPatch,
    ) -> Result<Option<Disco>, ApplicationError> {
        debug!(disco_id = %id, "Patching disco in SQLite store");
        let key = parse_id(id)?;
        let patch = patch.clone();
        self.with_connection("update", move |conn| {
            // Read, merge and write back under one transaction.
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| storage_error("begin update", e))?;
            let document: Option<String> = tx
                .query_row(
                    "SELECT document FROM discos WHERE id = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| storage_error("read for update", e))?;
            let Some(document) = document else {
                return Ok(None);
            };

            let merged = decode(key.clone(), &document)?.patched(patch);
            tx.execute(
                "UPDATE discos SET document = ?2 WHERE id = ?1",
                params![key, encode(merged.fields())?],
            )
            .map_err(|e| storage_error("update", e))?;
            tx.commit().map_err(|e| storage_error("commit update", e))?;
            Ok(Some(merged))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &DiscoId) -> Result<bool, ApplicationError> {
        debug!(disco_id = %id, "Deleting disco from SQLite store");
        let key = parse_id(id)?;
        self.with_connection("delete", move |conn| {
            let changed = conn
                .execute("DELETE FROM discos WHERE id = ?1", params![key])
                .map_err(|e| storage_error("delete", e))?;
            Ok(changed > 0)
        })
        .await
    }
}
