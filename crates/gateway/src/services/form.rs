//! Form Validator for article submissions
//!
//! Every check runs and every failure is reported together, so the author
//! sees all problems with the form at once. Only the document conversion
//! depends on earlier checks: it runs once the rest of the form is clean.

use super::keywords::{keywords_allowed, normalize_keywords};
use apit_common::db::models::Topic;
use apit_common::db::DataGateway;
use apit_common::errors::{AppError, FieldErrors, Result};
use apit_common::metrics;
use apit_ingestion::{file_extension, is_word_extension, DocumentIngestor, StoredDocument};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;
use validator::Validate;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_TOPIC: &str = "topic_id";
pub const FIELD_KEYWORDS: &str = "key_words";
pub const FIELD_FILE: &str = "doc_file";

pub(crate) const MSG_TOPIC: &str = "this topic cannot be used";
pub(crate) const MSG_KEYWORDS: &str = "Unsupported character detected";
const MSG_FILE_MISSING: &str = "please attach a file with the article";
const MSG_FILE_FORMAT: &str = "invalid file format (only .doc and .docx are accepted)";
const MSG_FILE_UNSAFE: &str = "this file cannot be saved because it may be unsafe for the service. \
     If that is not the case, please contact the site administration";

/// Uploaded file as received from the client
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Raw article submission
#[derive(Debug, Clone, Default, Validate)]
pub struct ArticleForm {
    #[validate(length(min = 1, max = 512, message = "title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 4000, message = "short description is required"))]
    pub short_description: String,

    pub topic_id: Option<String>,

    pub key_words: String,

    pub doc_file: Option<UploadedFile>,
}

/// A submission that passed review; its document is already stored
#[derive(Debug)]
pub struct ValidatedSubmission {
    pub topic: Topic,
    pub key_words: String,
    pub unique_address: String,
    /// Removed again unless the article is persisted
    pub document: StoredDocument,
}

pub struct FormValidator {
    gateway: Arc<dyn DataGateway>,
    ingestor: Arc<DocumentIngestor>,
}

impl FormValidator {
    pub fn new(gateway: Arc<dyn DataGateway>, ingestor: Arc<DocumentIngestor>) -> Self {
        Self { gateway, ingestor }
    }

    /// Review a submission to `conference_id`; rejected forms come back as
    /// `AppError::Form`
    pub async fn review(&self, form: &ArticleForm, conference_id: Uuid) -> Result<ValidatedSubmission> {
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let topic = self.resolve_topic(form.topic_id.as_deref(), conference_id).await?;
        if topic.is_none() {
            errors.add(FIELD_TOPIC, MSG_TOPIC);
        }

        if !keywords_allowed(&form.key_words) {
            errors.add(FIELD_KEYWORDS, MSG_KEYWORDS);
        }

        let upload = form.doc_file.as_ref().filter(|f| !f.contents.is_empty());
        let extension = match upload {
            None => {
                errors.add(FIELD_FILE, MSG_FILE_MISSING);
                None
            }
            Some(file) => match file_extension(&file.file_name) {
                Some(ext) if is_word_extension(&ext) => Some(ext),
                _ => {
                    errors.add(FIELD_FILE, MSG_FILE_FORMAT);
                    None
                }
            },
        };

        // Nothing is written to storage for a form that is going back anyway
        let (Some(file), Some(extension), Some(topic), true) =
            (upload, extension, topic, errors.is_empty())
        else {
            return Err(self.reject(errors));
        };

        let unique_address = self.gateway.generate_unique_address().await?;
        let document = match self
            .ingestor
            .ingest(&file.contents, &unique_address, &extension)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                error!(
                    unique_address = %unique_address,
                    file_name = %file.file_name,
                    error = %e,
                    "Rejected upload after conversion failure"
                );
                return Err(self.reject(FieldErrors::single(FIELD_FILE, MSG_FILE_UNSAFE)));
            }
        };

        Ok(ValidatedSubmission {
            topic,
            key_words: normalize_keywords(&form.key_words),
            unique_address,
            document,
        })
    }

    /// Topics of other conferences are treated as unknown
    async fn resolve_topic(&self, raw: Option<&str>, conference_id: Uuid) -> Result<Option<Topic>> {
        let Some(id) = raw.and_then(|r| Uuid::parse_str(r.trim()).ok()) else {
            debug!(topic_id = ?raw, "Topic id missing or malformed");
            return Ok(None);
        };

        let topic = self.gateway.find_topic_by_id(id).await?;
        Ok(topic.filter(|t| {
            let owned = t.conference_id == conference_id;
            if !owned {
                debug!(topic_id = %id, owner = %t.conference_id, "Topic belongs to another conference");
            }
            owned
        }))
    }

    fn reject(&self, errors: FieldErrors) -> AppError {
        metrics::record_rejection(errors.fields());
        AppError::Form(errors)
    }
}
