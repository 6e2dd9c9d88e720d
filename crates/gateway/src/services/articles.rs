//! Article submission workflow
//!
//! Review, ingestion, assembly and persistence of articles, plus the reads
//! and the creator-only delete that go with them.

use super::assembler::{assemble_article, ArticleDraft};
use super::form::{ArticleForm, FormValidator, FIELD_KEYWORDS, MSG_KEYWORDS, MSG_TOPIC};
use super::keywords::{keywords_allowed, split_inline_keywords};
use apit_common::auth::AuthContext;
use apit_common::db::models::{Article, Conference, Topic, User, KEYWORD_SEPARATOR};
use apit_common::db::{ArticleGraph, CurrentConference, DataGateway};
use apit_common::errors::{AppError, FieldErrors, Result};
use apit_common::metrics;
use apit_ingestion::{DocumentIngestor, DocumentPaths, StoredDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

pub const FIELD_ID: &str = "id";
pub const FIELD_CREATOR: &str = "creator";
pub const FIELD_CONFERENCE: &str = "conference";
pub const FIELD_TOPIC_NAME: &str = "topic";

const MSG_NOT_EXIST: &str = "Article not exist";
const MSG_ACCESS_DENIED: &str = "User access denied";
const MSG_NO_CONFERENCE: &str = "no conference is accepting articles right now";

/// Inline rich-text submission
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ComposeForm {
    #[validate(length(min = 1, max = 512, message = "title is required"))]
    pub title: String,

    #[serde(default)]
    pub short_description: String,

    /// Topic name within the current conference
    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub create_new_topic: bool,

    #[serde(default)]
    pub key_words: String,

    #[serde(default)]
    pub text_html: String,
}

/// Article as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetails {
    pub article: Article,
    pub keywords: Vec<String>,
    pub author_ids: Vec<Uuid>,
}

/// Stored files of a persisted article
pub fn stored_paths(article: &Article) -> DocumentPaths {
    DocumentPaths {
        html_file: article.html_file_path.clone(),
        original_file: article.docx_file_path.clone(),
    }
}

pub struct ArticleService {
    gateway: Arc<dyn DataGateway>,
    ingestor: Arc<DocumentIngestor>,
    validator: FormValidator,
}

impl ArticleService {
    pub fn new(gateway: Arc<dyn DataGateway>, ingestor: Arc<DocumentIngestor>) -> Self {
        let validator = FormValidator::new(gateway.clone(), ingestor.clone());
        Self {
            gateway,
            ingestor,
            validator,
        }
    }

    /// Conference an article can be submitted to; `None` without topics
    pub async fn submission_target(&self) -> Result<Option<CurrentConference>> {
        Ok(self
            .gateway
            .current_conference()
            .await?
            .filter(|current| !current.topics.is_empty()))
    }

    /// Upload flow: review the form, store the document, persist the article
    #[instrument(skip(self, auth, form), fields(user_id = %auth.user_id))]
    pub async fn submit(&self, auth: &AuthContext, form: ArticleForm) -> Result<Article> {
        let conference = self.require_conference().await?;
        let author = self.author(auth).await?;

        let submission = self.validator.review(&form, conference.id).await?;

        let draft = ArticleDraft {
            title: form.title,
            short_description: form.short_description,
            key_words: submission.key_words,
            unique_address: submission.unique_address,
            paths: submission.document.paths().clone(),
        };
        let graph = assemble_article(draft, &submission.topic, &conference, &author, now());

        let article = self.persist(graph, submission.document).await?;
        metrics::record_submission("upload");
        Ok(article)
    }

    /// Inline flow: the author typed the article body in the editor
    #[instrument(skip(self, auth, form), fields(user_id = %auth.user_id))]
    pub async fn compose(&self, auth: &AuthContext, form: ComposeForm) -> Result<Article> {
        let mut errors = match form.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if !keywords_allowed(&form.key_words) {
            errors.add(FIELD_KEYWORDS, MSG_KEYWORDS);
        }

        let Some(current) = self.gateway.current_conference().await? else {
            errors.add(FIELD_CONFERENCE, MSG_NO_CONFERENCE);
            return Err(reject(errors));
        };
        let conference = current.conference;
        let author = self.author(auth).await?;

        let topic = self.resolve_topic(&conference, &form, &mut errors).await?;
        let Some((topic, created)) = topic.filter(|_| errors.is_empty()) else {
            return Err(reject(errors));
        };

        let unique_address = self.gateway.generate_unique_address().await?;
        let document = self
            .ingestor
            .save_inline_html(&unique_address, &form.text_html)
            .await?;

        let draft = ArticleDraft {
            title: form.title,
            short_description: form.short_description,
            key_words: split_inline_keywords(&form.key_words).join(KEYWORD_SEPARATOR),
            unique_address,
            paths: document.paths().clone(),
        };
        let mut graph = assemble_article(draft, &topic, &conference, &author, now());
        if created {
            graph.new_topic = Some(topic);
        }

        let article = self.persist(graph, document).await?;
        metrics::record_submission("inline");
        Ok(article)
    }

    /// Article behind a unique address
    pub async fn by_address(&self, address: &str) -> Result<ArticleDetails> {
        let article = self
            .gateway
            .find_article_by_address(address)
            .await?
            .ok_or_else(|| AppError::not_found("article", address))?;
        self.details(article).await
    }

    /// Article loaded for editing; a bad id is reported on the `id` field
    pub async fn edit_view(&self, id: Option<&str>) -> Result<ArticleDetails> {
        let Some(article_id) = id.and_then(|raw| Uuid::parse_str(raw).ok()) else {
            return Err(AppError::Form(FieldErrors::single(FIELD_ID, MSG_NOT_EXIST)));
        };

        match self.gateway.find_article_by_id(article_id).await? {
            Some(article) => self.details(article).await,
            None => Err(AppError::Form(FieldErrors::single(FIELD_ID, MSG_NOT_EXIST))),
        }
    }

    /// Saving edits is not available yet
    pub async fn edit_submit(&self, auth: &AuthContext) -> Result<Article> {
        warn!(user_id = %auth.user_id, "Article edit attempted");
        Err(AppError::NotImplemented {
            operation: "article edit".to_string(),
        })
    }

    /// Delete an article on behalf of its creator.
    ///
    /// Unknown ids and non-creators are reported as field errors; the
    /// article is left untouched in both cases.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn delete(&self, auth: &AuthContext, id: &str) -> Result<()> {
        let Some(article_id) = Uuid::parse_str(id).ok() else {
            return Err(AppError::Form(FieldErrors::single(FIELD_ID, MSG_NOT_EXIST)));
        };

        if !self.gateway.article_exists(article_id).await? {
            return Err(AppError::Form(FieldErrors::single(FIELD_ID, MSG_NOT_EXIST)));
        }
        let Some(article) = self.gateway.find_article_by_id(article_id).await? else {
            return Err(AppError::Form(FieldErrors::single(FIELD_ID, MSG_NOT_EXIST)));
        };

        let authors = self.gateway.article_authors(article_id).await?;
        if !authors.iter().any(|link| link.user_id == auth.user_id) {
            warn!(article_id = %article_id, "Delete denied for non-creator");
            return Err(AppError::Form(FieldErrors::single(FIELD_CREATOR, MSG_ACCESS_DENIED)));
        }

        self.gateway.delete_article(article_id).await?;
        self.ingestor.discard(&stored_paths(&article)).await;
        metrics::record_deletion();

        info!(article_id = %article_id, unique_address = %article.unique_address, "Article deleted");
        Ok(())
    }

    async fn require_conference(&self) -> Result<Conference> {
        match self.gateway.current_conference().await? {
            Some(current) => Ok(current.conference),
            None => Err(reject(FieldErrors::single(FIELD_CONFERENCE, MSG_NO_CONFERENCE))),
        }
    }

    async fn author(&self, auth: &AuthContext) -> Result<User> {
        self.gateway
            .find_user_by_id(auth.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized {
                message: "Unknown user".to_string(),
            })
    }

    /// Existing topic by name, or a new one (flagged `true`) that is written
    /// together with the article
    async fn resolve_topic(
        &self,
        conference: &Conference,
        form: &ComposeForm,
        errors: &mut FieldErrors,
    ) -> Result<Option<(Topic, bool)>> {
        let name = form.topic.trim();
        if name.is_empty() {
            errors.add(FIELD_TOPIC_NAME, MSG_TOPIC);
            return Ok(None);
        }

        if let Some(topic) = self.gateway.find_topic_by_name(conference.id, name).await? {
            return Ok(Some((topic, false)));
        }

        if !form.create_new_topic {
            errors.add(FIELD_TOPIC_NAME, MSG_TOPIC);
            return Ok(None);
        }

        let topic = Topic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            conference_id: conference.id,
        };
        Ok(Some((topic, true)))
    }

    /// Write the article graph; stored files are dropped if that fails
    async fn persist(&self, graph: ArticleGraph, document: StoredDocument) -> Result<Article> {
        let article = graph.article.clone();
        let new_topic = graph.new_topic.clone();

        if let Err(e) = self.gateway.create_article(graph).await {
            error!(
                unique_address = %article.unique_address,
                error = %e,
                "Failed to persist article, discarding stored files"
            );
            document.discard().await;
            return Err(e);
        }
        document.keep();

        if let Some(topic) = new_topic {
            info!(topic_id = %topic.id, name = %topic.name, "Topic created from submission");
        }
        info!(
            article_id = %article.id,
            unique_address = %article.unique_address,
            topic_id = %article.topic_id,
            "Article created"
        );
        Ok(article)
    }

    async fn details(&self, article: Article) -> Result<ArticleDetails> {
        let author_ids = self
            .gateway
            .article_authors(article.id)
            .await?
            .into_iter()
            .map(|link| link.user_id)
            .collect();
        let keywords = article.keyword_list().into_iter().map(String::from).collect();

        Ok(ArticleDetails {
            article,
            keywords,
            author_ids,
        })
    }
}

fn reject(errors: FieldErrors) -> AppError {
    metrics::record_rejection(errors.fields());
    AppError::Form(errors)
}

fn now() -> chrono::DateTime<chrono::FixedOffset> {
    chrono::Utc::now().fixed_offset()
}
