use async_trait::async_trait;
use dashmap::DashMap;
use discos_application::{ApplicationError, DiscoRepository};
use discos_domain::{Disco, DiscoFields, DiscoId, DiscoPatch};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

// --- Volatile Disco Store ---

/// Process-local store. State resets on restart.
///
/// Each disco is keyed by a surrogate key drawn from a monotonically
/// increasing counter, so deleting one disco never shifts or frees the
/// identifier of another.
#[derive(Debug, Clone)]
pub struct InMemoryDiscoRepository {
    // Surrogate key -> Disco
    store: Arc<DashMap<u64, Arc<Disco>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InMemoryDiscoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDiscoRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Accepts only the canonical decimal form, so `01` or `+1` never alias `1`.
    fn parse_key(id: &DiscoId) -> Result<u64, ApplicationError> {
        id.as_str()
            .parse::<u64>()
            .ok()
            .filter(|key| key.to_string() == id.as_str())
            .ok_or_else(|| ApplicationError::MalformedId(id.to_string()))
    }
}

#[async_trait]
impl DiscoRepository for InMemoryDiscoRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Disco>, ApplicationError> {
        debug!("Listing discos from in-memory store");
        let mut entries: Vec<(u64, Arc<Disco>)> = self
            .store
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        // DashMap iteration order is arbitrary; keys follow insertion order.
        entries.sort_unstable_by_key(|(key, _)| *key);
        Ok(entries
            .into_iter()
            .map(|(_, disco)| (*disco).clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &DiscoId) -> Result<Option<Disco>, ApplicationError> {
        debug!(disco_id = %id, "Getting disco from in-memory store");
        let key = Self::parse_key(id)?;
        Ok(self.store.get(&key).map(|disco_ref| (**disco_ref).clone()))
    }

    #[instrument(skip(self, fields))]
    async fn insert(&self, fields: &DiscoFields) -> Result<Disco, ApplicationError> {
        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        let disco = Disco::new(DiscoId::new(key.to_string()), fields.clone());
        debug!(disco_id = key, "Inserting disco into in-memory store");
        self.store.insert(key, Arc::new(disco.clone()));
        Ok(disco)
    }

    #[instrument(skip(self, disco), fields(disco_id = %disco.id()))]
    async fn replace(&self, disco: &Disco) -> Result<bool, ApplicationError> {
        debug!("Replacing disco in in-memory store");
        let key = Self::parse_key(disco.id())?;
        // Only overwrite an existing entry; never resurrect a deleted one.
        match self.store.get_mut(&key) {
            Some(mut stored) => {
                *stored = Arc::new(disco.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: &DiscoId,
        patch: &DiscoPatch,
    ) -> Result<Option<Disco>, ApplicationError> {
        debug!(disco_id = %id, "Patching disco in in-memory store");
        let key = Self::parse_key(id)?;
        // The shard lock is held from read to write.
        Ok(self.store.get_mut(&key).map(|mut stored| {
            let merged = stored.patched(patch.clone());
            *stored = Arc::new(merged.clone());
            merged
        }))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &DiscoId) -> Result<bool, ApplicationError> {
        debug!(disco_id = %id, "Deleting disco from in-memory store");
        let key = Self::parse_key(id)?;
        Ok(self.store.remove(&key).is_some())
    }
}
