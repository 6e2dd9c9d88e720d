//! Document ingestion
//!
//! Stores an uploaded Word document under its unique address, converts it
//! to HTML and reports the outcome. A failed or cancelled conversion leaves
//! nothing behind, and the stored files stay guarded until the caller keeps
//! them.

use crate::converter::DocumentConverter;
use crate::errors::IngestionError;
use crate::paths::{is_word_extension, DocumentPaths};
use crate::storage::{DocumentStore, StoredDocument};
use apit_common::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Placeholder stored for inline articles submitted without a body
pub const EMPTY_INLINE_BODY: &str = " ==== Empty ====";

pub struct DocumentIngestor {
    store: DocumentStore,
    converter: Arc<dyn DocumentConverter>,
}

impl DocumentIngestor {
    pub fn new(store: DocumentStore, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { store, converter }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Persist the upload and its HTML rendition under `unique_address`
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn ingest(
        &self,
        contents: &[u8],
        unique_address: &str,
        extension: &str,
    ) -> Result<StoredDocument, IngestionError> {
        info!(extension = %extension, "Upload file with extension");

        if !is_word_extension(extension) {
            return Err(IngestionError::UnsupportedExtension(extension.to_string()));
        }

        let paths = DocumentPaths::for_upload(unique_address, extension);
        let original = paths
            .original_file
            .clone()
            .unwrap_or_else(|| paths.html_file.clone());
        let output = self.store.path_of(&paths.html_file);
        let document = self.store.guard(paths);

        let input = self.store.write(&original, contents).await?;

        let start = Instant::now();
        let result = self.converter.convert(&input, &output).await;
        metrics::record_conversion(start.elapsed().as_secs_f64(), result.is_ok());

        if let Err(e) = result {
            error!(
                converter = self.converter.name(),
                error = %e,
                "Document converter error"
            );
            document.discard().await;
            return Err(e);
        }

        info!(
            html = %document.paths().html_file,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Document converted"
        );
        Ok(document)
    }

    /// Store author-supplied HTML under `unique_address`
    pub async fn save_inline_html(
        &self,
        unique_address: &str,
        html: &str,
    ) -> Result<StoredDocument, IngestionError> {
        let document = self.store.guard(DocumentPaths::for_inline(unique_address));
        let body = if html.trim().is_empty() { EMPTY_INLINE_BODY } else { html };

        self.store.write(&document.paths().html_file, body.as_bytes()).await?;
        Ok(document)
    }

    /// Drop stored artifacts of a deleted article
    pub async fn discard(&self, paths: &DocumentPaths) {
        self.store.remove_all(paths).await;
    }

    pub async fn read_html(&self, html_file: &str) -> Result<String, IngestionError> {
        self.store.read_to_string(html_file).await
    }
}
