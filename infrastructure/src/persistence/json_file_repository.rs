use application::{ApplicationError, StoreRepository};
use async_trait::async_trait;
use domain::StoreDocument;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Store repository backed by a single pretty-printed JSON file.
///
/// Every `load` re-reads the file and every `save` rewrites it completely.
/// Writes land in a sibling `.tmp` file which is synced and then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStoreRepository {
    path: PathBuf,
}

impl JsonFileStoreRepository {
    /// Opens the store at `path`, creating it with empty collections if it does not exist.
    #[instrument]
    pub async fn open(path: PathBuf) -> Result<Self, ApplicationError> {
        let repo = Self { path };

        if let Some(parent) = repo.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| repo.io_error("create parent directory of", e))?;
        }

        let temp_path = repo.temp_path();
        if fs::try_exists(&temp_path).await.unwrap_or(false) {
            warn!(path = %temp_path.display(), "Removing leftover file from an interrupted write");
            if let Err(e) = fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), "Could not remove leftover file: {}", e);
            }
        }

        let exists = fs::try_exists(&repo.path)
            .await
            .map_err(|e| repo.io_error("check", e))?;
        if exists {
            debug!(path = %repo.path.display(), "Using existing store file");
        } else {
            info!(
                path = %repo.path.display(),
                "Store file not found, creating it with empty collections"
            );
            repo.save(&StoreDocument::default()).await?;
        }
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> ApplicationError {
        ApplicationError::StoreUnavailable(format!(
            "failed to {} '{}': {}",
            action,
            self.path.display(),
            e
        ))
    }

    async fn write_atomic(&self, content: &[u8]) -> Result<(), ApplicationError> {
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| self.io_error("create temp file for", e))?;
        file.write_all(content)
            .await
            .map_err(|e| self.io_error("write temp file for", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.io_error("sync temp file for", e))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error("replace", e))?;
        debug!(path = %self.path.display(), bytes = content.len(), "Atomic write completed");
        Ok(())
    }
}

#[async_trait]
impl StoreRepository for JsonFileStoreRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<StoreDocument, ApplicationError> {
        let raw = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error("read", e))?;
        let document: StoreDocument = serde_json::from_str(&raw).map_err(|e| {
            ApplicationError::StoreCorrupt(format!("'{}': {}", self.path.display(), e))
        })?;
        debug!(
            skills = document.skills.len(),
            projects = document.projects.len(),
            "Loaded store document"
        );
        Ok(document)
    }

    #[instrument(skip(self, document), fields(path = %self.path.display()))]
    async fn save(&self, document: &StoreDocument) -> Result<(), ApplicationError> {
        let content = serde_json::to_vec_pretty(document).map_err(|e| {
            ApplicationError::StoreCorrupt(format!("failed to serialize store document: {}", e))
        })?;
        self.write_atomic(&content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Project, ProjectDraft, RecordId, Skill};
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("nested").join("data.json")
    }

    #[tokio::test]
    async fn open_creates_file_with_empty_collections() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let repo = JsonFileStoreRepository::open(path.clone()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "{\n  \"skills\": [],\n  \"projects\": []\n}");
        assert_eq!(repo.load().await.unwrap(), StoreDocument::default());
    }

    #[tokio::test]
    async fn open_keeps_existing_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"skills":[{"id":1,"name":"Go","level":"Intermediate"}],"projects":[]}"#,
        )
        .unwrap();

        let repo = JsonFileStoreRepository::open(path).await.unwrap();
        let document = repo.load().await.unwrap();
        assert_eq!(document.skills.len(), 1);
        assert_eq!(document.skills[0].id, RecordId::new(1));
    }

    #[tokio::test]
    async fn open_removes_leftover_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let leftover = dir.path().join("data.json.tmp");
        std::fs::write(&leftover, "{ half written").unwrap();

        JsonFileStoreRepository::open(path).await.unwrap();
        assert!(!leftover.exists());
    }

    #[tokio::test]
    async fn save_then_load_returns_same_document() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileStoreRepository::open(store_path(&dir)).await.unwrap();

        let mut document = StoreDocument::default();
        document.append(Skill {
            id: RecordId::new(1_700_000_000_000),
            name: Some(serde_json::json!("Rust")),
            level: None,
        });
        document.append(<Project as domain::Record>::from_draft(
            RecordId::new(5),
            ProjectDraft {
                title: Some(serde_json::json!("Portfolio")),
                description: Some(serde_json::json!("Personal site")),
            },
        ));
        repo.save(&document).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), document);
        assert!(!repo.temp_path().exists());
        let raw = std::fs::read_to_string(repo.path()).unwrap();
        assert!(!raw.contains("level"));
    }

    #[tokio::test]
    async fn load_fails_when_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileStoreRepository::open(store_path(&dir)).await.unwrap();
        std::fs::remove_file(repo.path()).unwrap();

        assert!(matches!(
            repo.load().await,
            Err(ApplicationError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn load_fails_when_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileStoreRepository::open(store_path(&dir)).await.unwrap();
        std::fs::write(repo.path(), "not json").unwrap();

        assert!(matches!(
            repo.load().await,
            Err(ApplicationError::StoreCorrupt(_))
        ));
    }
}
