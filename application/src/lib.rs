use async_trait::async_trait;
use discos_domain::{Disco, DiscoFields, DiscoId, DiscoPatch, DiscoSchema, DomainError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Disco not found: {0}")]
    NotFound(String),
    #[error("Malformed disco id '{0}'")]
    MalformedId(String),
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Infrastructure Interfaces (Traits) ---

/// Storage contract shared by the volatile and the persistent store.
///
/// Identifiers are minted by the implementation on `insert` and are never
/// reused. An identifier the implementation cannot parse yields
/// [`ApplicationError::MalformedId`].
#[async_trait]
pub trait DiscoRepository: Send + Sync {
    /// Returns every stored disco in insertion order.
    async fn list(&self) -> Result<Vec<Disco>, ApplicationError>;
    /// Retrieves a disco by its ID.
    async fn get(&self, id: &DiscoId) -> Result<Option<Disco>, ApplicationError>;
    /// Stores new fields under a freshly assigned ID.
    async fn insert(&self, fields: &DiscoFields) -> Result<Disco, ApplicationError>;
    /// Overwrites the fields of an existing disco. Returns false if the ID is unknown.
    async fn replace(&self, disco: &Disco) -> Result<bool, ApplicationError>;
    /// Merges `patch` into the currently stored disco as one atomic step and
    /// returns the merged record, or `None` if the ID is unknown.
    async fn update(
        &self,
        id: &DiscoId,
        patch: &DiscoPatch,
    ) -> Result<Option<Disco>, ApplicationError>;
    /// Deletes a disco by its ID. Returns true if deleted.
    async fn delete(&self, id: &DiscoId) -> Result<bool, ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// A stored disco as returned by the API.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[schema(example = json!({"id": "1", "name": "Abbey Road", "quantity": 17}))]
pub struct DiscoResponse {
    /// Store-assigned identifier.
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

impl From<Disco> for DiscoResponse {
    fn from(disco: Disco) -> Self {
        Self {
            id: disco.id().to_string(),
            name: disco.name().to_string(),
            quantity: disco.quantity(),
        }
    }
}

/// Body of `POST /discos` and `PUT /discos/{id}`. Unknown fields are ignored.
#[derive(Debug, ToSchema)]
#[schema(example = json!({"name": "Abbey Road", "quantity": 17}))]
pub struct DiscoRequest {
    /// Non-empty name of the disco.
    pub name: String,
    /// Number of tracks; must be an integer.
    pub quantity: i64,
}

/// Body of `PATCH /discos/{id}`. Absent or null fields keep their stored value.
#[derive(Debug, ToSchema)]
#[schema(example = json!({"quantity": 18}))]
pub struct DiscoPatchRequest {
    pub name: Option<String>,
    pub quantity: Option<i64>,
}

/// Confirmation or error message body.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Application Services (Use Cases) ---

/// Service for the disco lifecycle: list, find, create, replace, update, delete.
pub struct DiscoService {
    repo: Arc<dyn DiscoRepository>,
    schema: DiscoSchema,
}

impl DiscoService {
    pub fn new(repo: Arc<dyn DiscoRepository>) -> Self {
        Self {
            repo,
            schema: DiscoSchema::default(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_discos(&self) -> Result<Vec<Disco>, ApplicationError> {
        debug!("Listing all discos");
        self.repo.list().await
    }

    #[instrument(skip(self))]
    pub async fn find_disco(&self, id: &str) -> Result<Disco, ApplicationError> {
        debug!(disco_id = %id, "Looking up disco");
        self.repo
            .get(&DiscoId::new(id))
            .await?
            .ok_or_else(|| {
                warn!(disco_id = %id, "Disco not found");
                ApplicationError::NotFound(id.to_string())
            })
    }

    #[instrument(skip(self, payload))]
    pub async fn create_disco(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<Disco, ApplicationError> {
        // Validate before touching the store so a bad payload never writes.
        let fields = self.schema.validate(payload)?;
        let disco = self.repo.insert(&fields).await?;
        info!(disco_id = %disco.id(), "Disco created");
        Ok(disco)
    }

    /// Replaces every field of a resolved disco.
    #[instrument(skip(self, existing, payload), fields(disco_id = %existing.id()))]
    pub async fn replace_disco(
        &self,
        existing: &Disco,
        payload: &Map<String, Value>,
    ) -> Result<Disco, ApplicationError> {
        let fields = self.schema.validate(payload)?;
        let updated = existing.replaced(fields);
        self.write_back(&updated).await?;
        info!("Disco replaced");
        Ok(updated)
    }

    /// Merges the present, non-null fields of `payload` into a resolved disco.
    ///
    /// The merge happens inside the store against the current record, so
    /// fields changed by a concurrent update since `existing` was resolved
    /// are kept.
    #[instrument(skip(self, existing, payload), fields(disco_id = %existing.id()))]
    pub async fn update_disco(
        &self,
        existing: &Disco,
        payload: &Map<String, Value>,
    ) -> Result<Disco, ApplicationError> {
        let patch = self.schema.patch(payload)?;
        if patch.is_empty() {
            debug!("Patch carries no known fields; nothing to write");
            return Ok(existing.clone());
        }
        // Every patched field is typed, so any merge of it with a stored record passes too.
        self.schema.check(existing.patched(patch.clone()).fields())?;

        match self.repo.update(existing.id(), &patch).await? {
            Some(updated) => {
                info!("Disco updated");
                Ok(updated)
            }
            None => {
                warn!("Disco vanished before it could be updated");
                Err(ApplicationError::NotFound(existing.id().to_string()))
            }
        }
    }

    #[instrument(skip(self, existing), fields(disco_id = %existing.id()))]
    pub async fn delete_disco(&self, existing: &Disco) -> Result<(), ApplicationError> {
        if self.repo.delete(existing.id()).await? {
            info!("Disco deleted");
            Ok(())
        } else {
            // Deleted by a concurrent request after the lookup.
            warn!("Disco vanished before it could be deleted");
            Err(ApplicationError::NotFound(existing.id().to_string()))
        }
    }

    async fn write_back(&self, disco: &Disco) -> Result<(), ApplicationError> {
        if self.repo.replace(disco).await? {
            Ok(())
        } else {
            warn!(disco_id = %disco.id(), "Disco vanished before it could be written");
            Err(ApplicationError::NotFound(disco.id().to_string()))
        }
    }
}
