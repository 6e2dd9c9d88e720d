//! User entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    
    #[sea_orm(column_type = "Text", unique)]
    pub user_name: String,
    
    #[sea_orm(column_type = "Text")]
    pub email: String,
    
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_own_articles_linking::Entity")]
    OwnArticles,
    
    #[sea_orm(has_many = "super::conference_participant::Entity")]
    Participations,
}

impl Related<super::user_own_articles_linking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnArticles.def()
    }
}

impl Related<super::conference_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
