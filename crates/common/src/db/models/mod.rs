//! SeaORM entity models
//!
//! Database entities for the conference service

mod article;
mod conference;
mod conference_image;
mod conference_participant;
mod topic;
mod user;
mod user_own_articles_linking;

pub use conference::{
    Entity as ConferenceEntity,
    Model as Conference,
    ActiveModel as ConferenceActiveModel,
    Column as ConferenceColumn,
};

pub use topic::{
    Entity as TopicEntity,
    Model as Topic,
    ActiveModel as TopicActiveModel,
    Column as TopicColumn,
};

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
    ArticleStatus,
    KEYWORD_SEPARATOR,
};

pub use user_own_articles_linking::{
    Entity as AuthorLinkEntity,
    Model as UserOwnArticlesLinking,
    ActiveModel as AuthorLinkActiveModel,
    Column as AuthorLinkColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use conference_participant::{
    Entity as ParticipantEntity,
    Model as ConferenceParticipant,
    ActiveModel as ParticipantActiveModel,
    Column as ParticipantColumn,
};

pub use conference_image::{
    Entity as ConferenceImageEntity,
    Model as ConferenceImage,
    ActiveModel as ConferenceImageActiveModel,
    Column as ConferenceImageColumn,
};
