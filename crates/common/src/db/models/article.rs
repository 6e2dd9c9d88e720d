//! Article entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of a submitted article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Uploaded,
}

impl From<String> for ArticleStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "uploaded" => ArticleStatus::Uploaded,
            _ => ArticleStatus::Uploaded,
        }
    }
}

impl From<ArticleStatus> for String {
    fn from(status: ArticleStatus) -> Self {
        match status {
            ArticleStatus::Uploaded => "uploaded".to_string(),
        }
    }
}

/// Separator used when keywords are stored as a single column
pub const KEYWORD_SEPARATOR: &str = ";";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    
    #[sea_orm(column_type = "Text", unique)]
    pub unique_address: String,
    
    #[sea_orm(column_type = "Text")]
    pub title: String,
    
    #[sea_orm(column_type = "Text")]
    pub short_description: String,
    
    /// Keywords joined with [`KEYWORD_SEPARATOR`]
    #[sea_orm(column_type = "Text")]
    pub key_words: String,
    
    #[sea_orm(column_type = "Text")]
    pub status: String,
    
    #[sea_orm(column_type = "Text")]
    pub html_file_path: String,
    
    /// Original document, absent for inline rich-text articles
    #[sea_orm(column_type = "Text", nullable)]
    pub docx_file_path: Option<String>,
    
    pub topic_id: Uuid,
    
    pub conference_id: Uuid,
    
    pub date_created: DateTimeWithTimeZone,
    
    pub date_last_modified: DateTimeWithTimeZone,
}

impl Model {
    /// Get the article status as an enum
    pub fn article_status(&self) -> ArticleStatus {
        ArticleStatus::from(self.status.clone())
    }
    
    /// Keywords split back into a list
    pub fn keyword_list(&self) -> Vec<&str> {
        self.key_words
            .split(KEYWORD_SEPARATOR)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id"
    )]
    Topic,
    
    #[sea_orm(
        belongs_to = "super::conference::Entity",
        from = "Column::ConferenceId",
        to = "super::conference::Column::Id",
        on_delete = "Cascade"
    )]
    Conference,
    
    #[sea_orm(has_many = "super::user_own_articles_linking::Entity")]
    Authors,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::conference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conference.def()
    }
}

impl Related<super::user_own_articles_linking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
