use async_trait::async_trait;
use domain::{Project, Record, RecordId, RecordKind, Skill, StoreDocument};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0} not found")]
    NotFound(RecordKind),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Store document is corrupt: {0}")]
    StoreCorrupt(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Loads and saves the whole store document. Implementations never cache.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Reads the full document from stable storage.
    async fn load(&self) -> Result<StoreDocument, ApplicationError>;
    /// Overwrites stable storage with the full document.
    async fn save(&self, document: &StoreDocument) -> Result<(), ApplicationError>;
}

/// Source of ids for newly created records.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> RecordId;
}

// --- Request/Response Models (DTOs) ---
// Create/update bodies deserialize straight into the domain drafts.

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn deleted(kind: RecordKind) -> Self {
        Self {
            message: format!("{} deleted", kind.label()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn not_found(kind: RecordKind) -> Self {
        Self {
            error: format!("{} not found", kind.label()),
        }
    }
}

// --- Shared Store ---

/// The store repository plus the single writer lock shared by every collection.
///
/// Read-modify-write cycles go through [`SharedStore::mutate`], which holds the lock
/// from load to save so concurrent mutations cannot overwrite each other.
pub struct SharedStore {
    repo: Arc<dyn StoreRepository>,
    write_lock: Mutex<()>,
}

impl SharedStore {
    pub fn new(repo: Arc<dyn StoreRepository>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn read(&self) -> Result<StoreDocument, ApplicationError> {
        self.repo.load().await
    }

    /// Loads the document, applies `apply`, then saves.
    /// Nothing is saved when `apply` returns an error.
    pub async fn mutate<T, F>(&self, apply: F) -> Result<T, ApplicationError>
    where
        F: FnOnce(&mut StoreDocument) -> Result<T, ApplicationError> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.repo.load().await?;
        let outcome = apply(&mut document)?;
        self.repo.save(&document).await.map_err(|e| {
            error!("Failed to save store document: {}", e);
            e
        })?;
        Ok(outcome)
    }
}

// --- Application Services (Use Cases) ---

/// List/create/update/delete for one collection of the store.
pub struct RecordService<R: Record> {
    store: Arc<SharedStore>,
    ids: Arc<dyn IdGenerator>,
    _record: PhantomData<fn() -> R>,
}

pub type SkillService = RecordService<Skill>;
pub type ProjectService = RecordService<Project>;

impl<R: Record> RecordService<R> {
    pub fn new(store: Arc<SharedStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            store,
            ids,
            _record: PhantomData,
        }
    }

    #[instrument(skip(self), fields(collection = R::KIND.collection()))]
    pub async fn list(&self) -> Result<Vec<R>, ApplicationError> {
        debug!("Listing records");
        let document = self.store.read().await?;
        Ok(document.records::<R>().to_vec())
    }

    #[instrument(skip(self, draft), fields(collection = R::KIND.collection()))]
    pub async fn create(&self, draft: R::Draft) -> Result<R, ApplicationError> {
        let id = self.ids.next_id();
        let record = R::from_draft(id, draft);
        let stored = record.clone();
        self.store
            .mutate(move |document| {
                document.append(stored);
                Ok(())
            })
            .await?;
        info!(record_id = %id, "Record created");
        Ok(record)
    }

    /// Replaces every non-id field of the first record matching `path_id`.
    /// The stored record takes the parsed path id regardless of any id in the draft.
    ///
    /// The store is always loaded first, so a broken store fails the request even
    /// when `path_id` is not a number. A path id that does not parse matches nothing.
    #[instrument(skip(self, draft), fields(collection = R::KIND.collection()))]
    pub async fn update(&self, path_id: &str, draft: R::Draft) -> Result<R, ApplicationError> {
        let id = parse_path_id(path_id);
        let result = self
            .store
            .mutate(move |document| {
                let id = id.ok_or(ApplicationError::NotFound(R::KIND))?;
                document
                    .replace(id, R::from_draft(id, draft))
                    .cloned()
                    .ok_or(ApplicationError::NotFound(R::KIND))
            })
            .await;
        match &result {
            Ok(_) => info!(record_id = %path_id, "Record updated"),
            Err(ApplicationError::NotFound(_)) => {
                warn!(record_id = %path_id, "Update target not found")
            }
            Err(e) => error!(record_id = %path_id, "Update failed: {}", e),
        }
        result
    }

    /// Removes every record matching `path_id` and returns how many were removed.
    /// The store is loaded and saved even when nothing matched.
    #[instrument(skip(self), fields(collection = R::KIND.collection()))]
    pub async fn delete(&self, path_id: &str) -> Result<usize, ApplicationError> {
        let id = parse_path_id(path_id);
        let removed = self
            .store
            .mutate(move |document| Ok(id.map_or(0, |id| document.remove_all::<R>(id))))
            .await?;
        if removed == 0 {
            info!(record_id = %path_id, "No record matched the delete request");
        } else {
            info!(record_id = %path_id, removed, "Records deleted");
        }
        Ok(removed)
    }
}

/// Parses a routed id. Values that are not whole numbers can never match a stored id.
fn parse_path_id(path_id: &str) -> Option<RecordId> {
    match path_id.parse::<RecordId>() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}
