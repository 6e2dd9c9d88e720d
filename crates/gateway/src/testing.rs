//! Test doubles shared by the gateway's unit tests

use crate::services::{ArticleService, ConferenceService};
use crate::AppState;
use apit_common::auth::{AuthContext, JwtManager};
use apit_common::config::AppConfig;
use apit_common::db::models::*;
use apit_common::db::{
    random_address, ArticleGraph, ConferenceOverview, CurrentConference, DataGateway,
};
use apit_common::errors::{AppError, Result};
use apit_ingestion::{DocumentConverter, DocumentIngestor, DocumentStore, IngestionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    conferences: HashMap<Uuid, Conference>,
    topics: HashMap<Uuid, Topic>,
    articles: HashMap<Uuid, Article>,
    links: Vec<UserOwnArticlesLinking>,
    participants: Vec<ConferenceParticipant>,
    images: Vec<ConferenceImage>,
}

/// `DataGateway` over hash maps, with counters for write assertions
#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    fail_article_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn insert_user(&self, user: User) {
        self.tables().users.insert(user.id, user);
    }

    pub fn insert_conference(&self, conference: Conference) {
        self.tables().conferences.insert(conference.id, conference);
    }

    pub fn insert_topic(&self, topic: Topic) {
        self.tables().topics.insert(topic.id, topic);
    }

    pub fn insert_participant(&self, participant: ConferenceParticipant) {
        self.tables().participants.push(participant);
    }

    pub fn insert_image(&self, image: ConferenceImage) {
        self.tables().images.push(image);
    }

    /// Number of successful write operations
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn article_count(&self) -> usize {
        self.tables().articles.len()
    }

    pub fn links(&self) -> Vec<UserOwnArticlesLinking> {
        self.tables().links.clone()
    }

    pub fn topic_count(&self) -> usize {
        self.tables().topics.len()
    }

    /// Make every subsequent article write or delete fail
    pub fn fail_article_writes(&self) {
        self.fail_article_writes.store(true, Ordering::SeqCst);
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn create_conference(&self, conference: Conference, topics: Vec<Topic>) -> Result<()> {
        let mut tables = self.tables();
        for topic in topics {
            tables.topics.insert(topic.id, topic);
        }
        tables.conferences.insert(conference.id, conference);
        drop(tables);
        self.wrote();
        Ok(())
    }

    async fn find_conference_by_id(&self, id: Uuid) -> Result<Option<Conference>> {
        Ok(self.tables().conferences.get(&id).cloned())
    }

    async fn conference_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables().conferences.contains_key(&id))
    }

    async fn delete_conference(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables();
        if tables.conferences.remove(&id).is_some() {
            tables.topics.retain(|_, t| t.conference_id != id);
            tables.articles.retain(|_, a| a.conference_id != id);
            tables.participants.retain(|p| p.conference_id != id);
            tables.images.retain(|i| i.conference_id != id);
            drop(tables);
            self.wrote();
        }
        Ok(())
    }

    async fn current_conference(&self) -> Result<Option<CurrentConference>> {
        let tables = self.tables();
        let Some(conference) = tables
            .conferences
            .values()
            .filter(|c| c.is_actual)
            .max_by_key(|c| c.date_start)
            .cloned()
        else {
            return Ok(None);
        };

        let mut topics: Vec<Topic> = tables
            .topics
            .values()
            .filter(|t| t.conference_id == conference.id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(CurrentConference { conference, topics }))
    }

    async fn conference_overview(&self, id: Uuid) -> Result<Option<ConferenceOverview>> {
        let tables = self.tables();
        let Some(conference) = tables.conferences.get(&id).cloned() else {
            return Ok(None);
        };

        let mut topics: Vec<Topic> = tables
            .topics
            .values()
            .filter(|t| t.conference_id == id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(ConferenceOverview {
            conference,
            topics,
            participant_count: tables.participants.iter().filter(|p| p.conference_id == id).count()
                as u64,
            images: tables.images.iter().filter(|i| i.conference_id == id).cloned().collect(),
        }))
    }

    async fn create_topic(&self, topic: Topic) -> Result<()> {
        self.tables().topics.insert(topic.id, topic);
        self.wrote();
        Ok(())
    }

    async fn find_topic_by_id(&self, id: Uuid) -> Result<Option<Topic>> {
        Ok(self.tables().topics.get(&id).cloned())
    }

    async fn find_topic_by_name(&self, conference_id: Uuid, name: &str) -> Result<Option<Topic>> {
        Ok(self
            .tables()
            .topics
            .values()
            .find(|t| t.conference_id == conference_id && t.name == name)
            .cloned())
    }

    async fn topic_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables().topics.contains_key(&id))
    }

    async fn topic_in_use(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables().articles.values().any(|a| a.topic_id == id))
    }

    async fn delete_topic(&self, id: Uuid) -> Result<()> {
        if self.tables().topics.remove(&id).is_some() {
            self.wrote();
        }
        Ok(())
    }

    async fn generate_unique_address(&self) -> Result<String> {
        loop {
            let address = random_address();
            if !self.tables().articles.values().any(|a| a.unique_address == address) {
                return Ok(address);
            }
        }
    }

    async fn create_article(&self, graph: ArticleGraph) -> Result<()> {
        if self.fail_article_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseConnection {
                message: "connection reset".to_string(),
            });
        }

        let mut tables = self.tables();
        if !tables.conferences.contains_key(&graph.article.conference_id) {
            return Err(AppError::not_found("conference", graph.article.conference_id));
        }
        if let Some(topic) = graph.new_topic {
            tables.topics.insert(topic.id, topic);
        }
        tables.links.extend(graph.authors);
        tables.articles.insert(graph.article.id, graph.article);
        drop(tables);
        self.wrote();
        Ok(())
    }

    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.tables().articles.get(&id).cloned())
    }

    async fn find_article_by_address(&self, address: &str) -> Result<Option<Article>> {
        Ok(self
            .tables()
            .articles
            .values()
            .find(|a| a.unique_address == address)
            .cloned())
    }

    async fn article_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables().articles.contains_key(&id))
    }

    async fn article_authors(&self, article_id: Uuid) -> Result<Vec<UserOwnArticlesLinking>> {
        Ok(self
            .tables()
            .links
            .iter()
            .filter(|l| l.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn delete_article(&self, id: Uuid) -> Result<()> {
        if self.fail_article_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseConnection {
                message: "connection reset".to_string(),
            });
        }

        let mut tables = self.tables();
        tables.links.retain(|l| l.article_id != id);
        if tables.articles.remove(&id).is_some() {
            drop(tables);
            self.wrote();
        }
        Ok(())
    }
}

/// Copies the input to the output, as a converter that always succeeds
pub struct CopyConverter;

#[async_trait]
impl DocumentConverter for CopyConverter {
    async fn convert(&self, input: &Path, output: &Path) -> std::result::Result<(), IngestionError> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "copy"
    }
}

/// Writes partial output, then hangs past any reasonable request deadline
pub struct StallingConverter;

#[async_trait]
impl DocumentConverter for StallingConverter {
    async fn convert(&self, _input: &Path, output: &Path) -> std::result::Result<(), IngestionError> {
        tokio::fs::write(output, b"<html>").await?;
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

/// Rejects every document the way a converter refusing a hostile file would
pub struct RefusingConverter;

#[async_trait]
impl DocumentConverter for RefusingConverter {
    async fn convert(&self, _input: &Path, _output: &Path) -> std::result::Result<(), IngestionError> {
        Err(IngestionError::ConversionFailed {
            status: "exit status: 77".to_string(),
            stderr: "General Error: macro execution blocked".to_string(),
        })
    }

    fn name(&self) -> &str {
        "refusing"
    }
}

pub fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        user_name: "author".to_string(),
        email: "author@example.org".to_string(),
        created_at: chrono::Utc::now().fixed_offset(),
    }
}

pub fn sample_conference() -> Conference {
    let now = chrono::Utc::now().fixed_offset();
    Conference {
        id: Uuid::new_v4(),
        unique_address: random_address(),
        is_actual: true,
        title: "Applied IT".to_string(),
        short_description: None,
        description: None,
        date_created: now,
        date_last_modified: now,
        date_start: now,
        date_finish: now + chrono::Duration::days(3),
    }
}

pub fn sample_topic(conference: &Conference, name: &str) -> Topic {
    Topic {
        id: Uuid::new_v4(),
        name: name.to_string(),
        conference_id: conference.id,
    }
}

pub fn auth_for(user: &User) -> AuthContext {
    AuthContext {
        user_id: user.id,
        scopes: vec![],
        request_id: "test".to_string(),
    }
}

/// A gateway seeded with a current conference, one topic and one user
pub struct Fixture {
    pub gateway: Arc<MemoryGateway>,
    pub ingestor: Arc<DocumentIngestor>,
    pub conference: Conference,
    pub topic: Topic,
    pub user: User,
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_converter(Arc::new(CopyConverter))
    }

    pub fn with_converter(converter: Arc<dyn DocumentConverter>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(MemoryGateway::new());

        let conference = sample_conference();
        let topic = sample_topic(&conference, "Distributed systems");
        let user = sample_user();
        gateway.insert_conference(conference.clone());
        gateway.insert_topic(topic.clone());
        gateway.insert_user(user.clone());

        let ingestor = Arc::new(DocumentIngestor::new(DocumentStore::new(dir.path()), converter));

        Self {
            gateway,
            ingestor,
            conference,
            topic,
            user,
            dir,
        }
    }

    /// Names of the files currently in the document store
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn articles(&self) -> ArticleService {
        ArticleService::new(self.gateway.clone(), self.ingestor.clone())
    }

    pub fn conferences(&self) -> ConferenceService {
        ConferenceService::new(self.gateway.clone())
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            Arc::new(AppConfig::default()),
            self.gateway.clone(),
            self.ingestor.clone(),
            Arc::new(JwtManager::new(TEST_JWT_SECRET, 3600)),
            None,
        )
    }

    pub fn bearer(&self, scopes: &[&str]) -> String {
        let jwt = JwtManager::new(TEST_JWT_SECRET, 3600);
        let token = jwt
            .generate_token(self.user.id, scopes.iter().map(|s| s.to_string()).collect())
            .unwrap();
        format!("Bearer {}", token)
    }
}
