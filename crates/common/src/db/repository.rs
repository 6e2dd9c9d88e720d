//! SeaORM repository implementing the persistence gateway
//!
//! Per-entity reads, existence checks and deletes share generic helpers
//! keyed by UUID primary keys; multi-row writes run in a transaction.

use crate::db::gateway::{
    random_address, ArticleGraph, ConferenceOverview, CurrentConference, DataGateway,
};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts at finding an unused address before giving up
const ADDRESS_ATTEMPTS: usize = 8;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
    
    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }
    
    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }
    
    // ========================================================================
    // Generic helpers
    // ========================================================================
    
    async fn get_by_id<E>(&self, id: Uuid) -> Result<Option<E::Model>>
    where
        E: EntityTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    {
        E::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }
    
    /// Checked against the primary, since callers act on the answer right away
    async fn exists<E>(&self, id: Uuid) -> Result<bool>
    where
        E: EntityTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    {
        let found = E::find_by_id(id).one(self.write_conn()).await?;
        Ok(found.is_some())
    }
    
    async fn delete_by_id<E, C>(conn: &C, id: Uuid) -> Result<bool>
    where
        E: EntityTrait,
        C: ConnectionTrait,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    {
        let result = E::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
    
    // ========================================================================
    // Transaction steps
    // ========================================================================
    
    /// Re-read the conference inside the transaction and point the article at it
    async fn add_article_to_conference<C>(
        conn: &C,
        conference_id: Uuid,
        article: &mut ArticleActiveModel,
    ) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let conference = ConferenceEntity::find_by_id(conference_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::not_found("conference", conference_id))?;
        
        article.conference_id = Set(conference.id);
        Ok(())
    }
    
    fn article_active_model(article: Article) -> ArticleActiveModel {
        ArticleActiveModel {
            id: Set(article.id),
            unique_address: Set(article.unique_address),
            title: Set(article.title),
            short_description: Set(article.short_description),
            key_words: Set(article.key_words),
            status: Set(article.status),
            html_file_path: Set(article.html_file_path),
            docx_file_path: Set(article.docx_file_path),
            topic_id: Set(article.topic_id),
            conference_id: Set(article.conference_id),
            date_created: Set(article.date_created),
            date_last_modified: Set(article.date_last_modified),
        }
    }
    
    fn topic_active_model(topic: Topic) -> TopicActiveModel {
        TopicActiveModel {
            id: Set(topic.id),
            name: Set(topic.name),
            conference_id: Set(topic.conference_id),
        }
    }
}

#[async_trait]
impl DataGateway for Repository {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
    
    // ========================================================================
    // User Operations
    // ========================================================================
    
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.get_by_id::<UserEntity>(id).await
    }
    
    // ========================================================================
    // Conference Operations
    // ========================================================================
    
    async fn create_conference(&self, conference: Conference, topics: Vec<Topic>) -> Result<()> {
        let txn = self.write_conn().begin().await?;
        
        ConferenceActiveModel {
            id: Set(conference.id),
            unique_address: Set(conference.unique_address),
            is_actual: Set(conference.is_actual),
            title: Set(conference.title),
            short_description: Set(conference.short_description),
            description: Set(conference.description),
            date_created: Set(conference.date_created),
            date_last_modified: Set(conference.date_last_modified),
            date_start: Set(conference.date_start),
            date_finish: Set(conference.date_finish),
        }
        .insert(&txn)
        .await?;
        
        for topic in topics {
            Self::topic_active_model(topic).insert(&txn).await?;
        }
        
        txn.commit().await?;
        Ok(())
    }
    
    async fn find_conference_by_id(&self, id: Uuid) -> Result<Option<Conference>> {
        self.get_by_id::<ConferenceEntity>(id).await
    }
    
    async fn conference_exists(&self, id: Uuid) -> Result<bool> {
        self.exists::<ConferenceEntity>(id).await
    }
    
    async fn delete_conference(&self, id: Uuid) -> Result<()> {
        if !Self::delete_by_id::<ConferenceEntity, _>(self.write_conn(), id).await? {
            debug!(conference_id = %id, "Conference already absent");
        }
        Ok(())
    }
    
    async fn current_conference(&self) -> Result<Option<CurrentConference>> {
        let conference = ConferenceEntity::find()
            .filter(ConferenceColumn::IsActual.eq(true))
            .order_by_desc(ConferenceColumn::DateStart)
            .one(self.read_conn())
            .await?;
        
        let Some(conference) = conference else {
            return Ok(None);
        };
        
        let topics = TopicEntity::find()
            .filter(TopicColumn::ConferenceId.eq(conference.id))
            .order_by_asc(TopicColumn::Name)
            .all(self.read_conn())
            .await?;
        
        Ok(Some(CurrentConference { conference, topics }))
    }
    
    async fn conference_overview(&self, id: Uuid) -> Result<Option<ConferenceOverview>> {
        let Some(conference) = self.get_by_id::<ConferenceEntity>(id).await? else {
            return Ok(None);
        };
        
        let topics = TopicEntity::find()
            .filter(TopicColumn::ConferenceId.eq(id))
            .order_by_asc(TopicColumn::Name)
            .all(self.read_conn())
            .await?;
        
        let participant_count = ParticipantEntity::find()
            .filter(ParticipantColumn::ConferenceId.eq(id))
            .count(self.read_conn())
            .await?;
        
        let images = ConferenceImageEntity::find()
            .filter(ConferenceImageColumn::ConferenceId.eq(id))
            .all(self.read_conn())
            .await?;
        
        Ok(Some(ConferenceOverview {
            conference,
            topics,
            participant_count,
            images,
        }))
    }
    
    // ========================================================================
    // Topic Operations
    // ========================================================================
    
    async fn create_topic(&self, topic: Topic) -> Result<()> {
        Self::topic_active_model(topic).insert(self.write_conn()).await?;
        Ok(())
    }
    
    async fn find_topic_by_id(&self, id: Uuid) -> Result<Option<Topic>> {
        self.get_by_id::<TopicEntity>(id).await
    }
    
    async fn find_topic_by_name(&self, conference_id: Uuid, name: &str) -> Result<Option<Topic>> {
        TopicEntity::find()
            .filter(TopicColumn::ConferenceId.eq(conference_id))
            .filter(TopicColumn::Name.eq(name))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }
    
    async fn topic_exists(&self, id: Uuid) -> Result<bool> {
        self.exists::<TopicEntity>(id).await
    }
    
    async fn topic_in_use(&self, id: Uuid) -> Result<bool> {
        let count = ArticleEntity::find()
            .filter(ArticleColumn::TopicId.eq(id))
            .count(self.read_conn())
            .await?;
        
        Ok(count > 0)
    }
    
    async fn delete_topic(&self, id: Uuid) -> Result<()> {
        Self::delete_by_id::<TopicEntity, _>(self.write_conn(), id).await?;
        Ok(())
    }
    
    // ========================================================================
    // Article Operations
    // ========================================================================
    
    async fn generate_unique_address(&self) -> Result<String> {
        for _ in 0..ADDRESS_ATTEMPTS {
            let address = random_address();
            let taken = ArticleEntity::find()
                .filter(ArticleColumn::UniqueAddress.eq(address.as_str()))
                .count(self.read_conn())
                .await?;
            
            if taken == 0 {
                return Ok(address);
            }
            
            warn!(address = %address, "Generated address collided, retrying");
        }
        
        Err(AppError::Internal {
            message: "Could not allocate a unique article address".to_string(),
        })
    }
    
    async fn create_article(&self, graph: ArticleGraph) -> Result<()> {
        let ArticleGraph {
            article,
            authors,
            new_topic,
        } = graph;
        let article_id = article.id;
        let conference_id = article.conference_id;
        
        let txn = self.write_conn().begin().await?;
        
        if let Some(topic) = new_topic {
            Self::topic_active_model(topic).insert(&txn).await?;
        }
        
        let mut active = Self::article_active_model(article);
        Self::add_article_to_conference(&txn, conference_id, &mut active).await?;
        active.insert(&txn).await?;
        
        for author in authors {
            AuthorLinkActiveModel {
                id: Set(author.id),
                user_id: Set(author.user_id),
                article_id: Set(author.article_id),
            }
            .insert(&txn)
            .await?;
        }
        
        txn.commit().await?;
        
        debug!(article_id = %article_id, conference_id = %conference_id, "Article graph committed");
        Ok(())
    }
    
    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        self.get_by_id::<ArticleEntity>(id).await
    }
    
    async fn find_article_by_address(&self, address: &str) -> Result<Option<Article>> {
        ArticleEntity::find()
            .filter(ArticleColumn::UniqueAddress.eq(address))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }
    
    async fn article_exists(&self, id: Uuid) -> Result<bool> {
        self.exists::<ArticleEntity>(id).await
    }
    
    async fn article_authors(&self, article_id: Uuid) -> Result<Vec<UserOwnArticlesLinking>> {
        AuthorLinkEntity::find()
            .filter(AuthorLinkColumn::ArticleId.eq(article_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
    
    async fn delete_article(&self, id: Uuid) -> Result<()> {
        let txn = self.write_conn().begin().await?;
        
        AuthorLinkEntity::delete_many()
            .filter(AuthorLinkColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;
        
        let removed = Self::delete_by_id::<ArticleEntity, _>(&txn, id).await?;
        txn.commit().await?;
        
        if !removed {
            debug!(article_id = %id, "Article already absent");
        }
        Ok(())
    }
}
