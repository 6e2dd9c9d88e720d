//! Conference entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    
    #[sea_orm(column_type = "Text", unique)]
    pub unique_address: String,
    
    /// Marks the conference currently accepting submissions
    pub is_actual: bool,
    
    #[sea_orm(column_type = "Text")]
    pub title: String,
    
    #[sea_orm(column_type = "Text", nullable)]
    pub short_description: Option<String>,
    
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    
    pub date_created: DateTimeWithTimeZone,
    
    pub date_last_modified: DateTimeWithTimeZone,
    
    pub date_start: DateTimeWithTimeZone,
    
    pub date_finish: DateTimeWithTimeZone,
}

// Two conference rows are the same conference when their ids match,
// regardless of which snapshot of the other columns each one holds.
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Model {}

impl Hash for Model {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::topic::Entity")]
    Topics,
    
    #[sea_orm(has_many = "super::article::Entity")]
    Articles,
    
    #[sea_orm(has_many = "super::conference_participant::Entity")]
    Participants,
    
    #[sea_orm(has_many = "super::conference_image::Entity")]
    Images,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Articles.def()
    }
}

impl Related<super::conference_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::conference_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
