//! Persistence gateway
//!
//! The storage-facing contract the HTTP layer depends on. Identity is always
//! supplied by the caller; authorization is the caller's job as well.

use crate::db::models::*;
use crate::errors::Result;
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use uuid::Uuid;

/// Length of generated unique addresses
pub const UNIQUE_ADDRESS_LEN: usize = 16;

/// An article together with the rows that must be written with it
#[derive(Debug, Clone)]
pub struct ArticleGraph {
    pub article: Article,
    pub authors: Vec<UserOwnArticlesLinking>,
    /// Topic introduced by this submission, inserted before the article
    pub new_topic: Option<Topic>,
}

/// The conference accepting submissions, with its topics
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConference {
    pub conference: Conference,
    pub topics: Vec<Topic>,
}

/// Conference with its owned collections summarised
#[derive(Debug, Clone, Serialize)]
pub struct ConferenceOverview {
    pub conference: Conference,
    pub topics: Vec<Topic>,
    pub participant_count: u64,
    pub images: Vec<ConferenceImage>,
}

/// Random lowercase alphanumeric address; uniqueness is checked by the gateway
pub fn random_address() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UNIQUE_ADDRESS_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Data access for conferences, topics, articles and users
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Check connectivity to the backing store
    async fn ping(&self) -> Result<()>;
    
    // Users
    
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    
    // Conferences
    
    /// Persist a conference and its initial topics atomically
    async fn create_conference(&self, conference: Conference, topics: Vec<Topic>) -> Result<()>;
    
    async fn find_conference_by_id(&self, id: Uuid) -> Result<Option<Conference>>;
    
    async fn conference_exists(&self, id: Uuid) -> Result<bool>;
    
    /// Remove a conference; unknown ids are ignored
    async fn delete_conference(&self, id: Uuid) -> Result<()>;
    
    /// Latest-starting conference flagged as actual
    async fn current_conference(&self) -> Result<Option<CurrentConference>>;
    
    async fn conference_overview(&self, id: Uuid) -> Result<Option<ConferenceOverview>>;
    
    // Topics
    
    async fn create_topic(&self, topic: Topic) -> Result<()>;
    
    async fn find_topic_by_id(&self, id: Uuid) -> Result<Option<Topic>>;
    
    async fn find_topic_by_name(&self, conference_id: Uuid, name: &str) -> Result<Option<Topic>>;
    
    async fn topic_exists(&self, id: Uuid) -> Result<bool>;
    
    /// Whether any article references the topic
    async fn topic_in_use(&self, id: Uuid) -> Result<bool>;
    
    async fn delete_topic(&self, id: Uuid) -> Result<()>;
    
    // Articles
    
    /// Fresh address not used by any article
    async fn generate_unique_address(&self) -> Result<String>;
    
    /// Persist an article, its author links, its new topic if any and its
    /// conference association in one transaction
    async fn create_article(&self, graph: ArticleGraph) -> Result<()>;
    
    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<Article>>;
    
    async fn find_article_by_address(&self, address: &str) -> Result<Option<Article>>;
    
    async fn article_exists(&self, id: Uuid) -> Result<bool>;
    
    async fn article_authors(&self, article_id: Uuid) -> Result<Vec<UserOwnArticlesLinking>>;
    
    /// Remove an article with its author links; unknown ids are ignored
    async fn delete_article(&self, id: Uuid) -> Result<()>;
}
