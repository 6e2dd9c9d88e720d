//! Apit document ingestion
//!
//! Turns uploaded Word documents into stored originals plus HTML
//! renditions through an external converter.

pub mod converter;
pub mod errors;
pub mod ingestor;
pub mod paths;
pub mod storage;

pub use converter::{CommandConverter, DocumentConverter};
pub use errors::IngestionError;
pub use ingestor::DocumentIngestor;
pub use paths::{file_extension, is_word_extension, DocumentPaths};
pub use storage::{DocumentStore, StoredDocument};
