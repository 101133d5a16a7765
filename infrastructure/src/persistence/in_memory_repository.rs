use application::{ApplicationError, StoreRepository};
use async_trait::async_trait;
use domain::StoreDocument;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Store repository kept entirely in memory. Used by tests and throwaway runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreRepository {
    document: Arc<RwLock<StoreDocument>>,
}

impl InMemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document instead of empty collections.
    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: Arc::new(RwLock::new(document)),
        }
    }
}

#[async_trait]
impl StoreRepository for InMemoryStoreRepository {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<StoreDocument, ApplicationError> {
        let document = self.document.read().await.clone();
        debug!(
            skills = document.skills.len(),
            projects = document.projects.len(),
            "Loaded store document from memory"
        );
        Ok(document)
    }

    #[instrument(skip(self, document))]
    async fn save(&self, document: &StoreDocument) -> Result<(), ApplicationError> {
        debug!(
            skills = document.skills.len(),
            projects = document.projects.len(),
            "Saving store document to memory"
        );
        *self.document.write().await = document.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{RecordId, Skill};

    #[tokio::test]
    async fn starts_empty_and_keeps_saved_document() {
        let repo = InMemoryStoreRepository::new();
        assert_eq!(repo.load().await.unwrap(), StoreDocument::default());

        let mut document = StoreDocument::default();
        document.append(Skill {
            id: RecordId::new(1),
            name: Some(serde_json::json!("Go")),
            level: None,
        });
        repo.save(&document).await.unwrap();

        // Clones share the same backing document.
        let other = repo.clone();
        assert_eq!(other.load().await.unwrap(), document);
    }
}
