use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::StoreError;
use super::models::Document;

/// Durable home of the user document. Injected into `Store` so persistence
/// can be swapped without touching call sites.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn load(&self) -> Result<Document, StoreError>;
    async fn save(&self, doc: &Document) -> Result<(), StoreError>;
}

/// Single pretty-printed JSON file. Missing files are seeded from an optional
/// bundled copy; writes go through a sibling temp file and a rename so a
/// crash mid-write never leaves a torn document behind.
pub struct JsonFileBackend {
    path: PathBuf,
    seed_path: Option<PathBuf>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>, seed_path: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_path,
        }
    }

    async fn ensure_exists(&self) -> Result<(), StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match &self.seed_path {
            Some(seed) if tokio::fs::try_exists(seed).await? => {
                tokio::fs::copy(seed, &self.path).await?;
                debug!(
                    path = %self.path.display(),
                    seed = %seed.display(),
                    "seeded store from bundled document"
                );
            }
            _ => {
                let empty = serde_json::to_string_pretty(&Document::default())?;
                tokio::fs::write(&self.path, empty).await?;
                debug!(path = %self.path.display(), "created empty store document");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load(&self) -> Result<Document, StoreError> {
        self.ensure_exists().await?;
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pretty = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, pretty).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory backend for tests and `AppState::fake()`.
#[derive(Default)]
pub struct MemoryBackend {
    doc: RwLock<Document>,
}

impl MemoryBackend {
    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: RwLock::new(doc),
        }
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Document, StoreError> {
        Ok(self.doc.read().await.clone())
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        *self.doc.write().await = doc.clone();
        Ok(())
    }
}
