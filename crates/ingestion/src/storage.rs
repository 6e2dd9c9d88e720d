//! On-disk document storage

use crate::errors::IngestionError;
use crate::paths::DocumentPaths;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Flat directory of stored documents keyed by file name
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create the storage directory if missing
    pub async fn ensure_root(&self) -> Result<(), IngestionError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub async fn write(&self, name: &str, contents: &[u8]) -> Result<PathBuf, IngestionError> {
        self.ensure_root().await?;
        let path = self.path_of(name);
        tokio::fs::write(&path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "Document stored");
        Ok(path)
    }

    pub async fn read_to_string(&self, name: &str) -> Result<String, IngestionError> {
        Ok(tokio::fs::read_to_string(self.path_of(name)).await?)
    }

    /// Remove a stored file; a missing file is not an error
    pub async fn remove(&self, name: &str) -> Result<(), IngestionError> {
        match tokio::fs::remove_file(self.path_of(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of every artifact of an article
    pub async fn remove_all(&self, paths: &DocumentPaths) {
        for name in paths.files() {
            if let Err(e) = self.remove(name).await {
                warn!(file = name, error = %e, "Failed to remove stored document");
            }
        }
    }

    /// Guard over files about to be written for `paths`
    pub fn guard(&self, paths: DocumentPaths) -> StoredDocument {
        StoredDocument {
            store: self.clone(),
            paths,
            armed: true,
        }
    }
}

/// Files of an article that is not persisted yet.
///
/// Dropping the guard removes them, so a request that fails or is cancelled
/// before the article is committed leaves nothing in storage. Call
/// [`StoredDocument::keep`] once the article row exists.
#[derive(Debug)]
#[must_use = "stored files are removed when the guard is dropped"]
pub struct StoredDocument {
    store: DocumentStore,
    paths: DocumentPaths,
    armed: bool,
}

impl StoredDocument {
    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    /// Hand the files over to the persisted article
    pub fn keep(mut self) -> DocumentPaths {
        self.armed = false;
        std::mem::take(&mut self.paths)
    }

    /// Remove the files now
    pub async fn discard(mut self) {
        self.store.remove_all(&self.paths).await;
        self.armed = false;
    }
}

impl Drop for StoredDocument {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // No runtime to await on here; the files are small
        for name in self.paths.files() {
            match std::fs::remove_file(self.store.path_of(name)) {
                Ok(()) => debug!(file = name, "Removed unclaimed document"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(file = name, error = %e, "Failed to remove unclaimed document"),
            }
        }
    }
}
