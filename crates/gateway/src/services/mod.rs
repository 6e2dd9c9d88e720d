//! Submission workflow and conference management

pub mod articles;
pub mod assembler;
pub mod conferences;
pub mod form;
pub mod keywords;

pub use articles::{ArticleDetails, ArticleService, ComposeForm};
pub use conferences::{ConferenceService, NewConference, NewTopic};
pub use form::{ArticleForm, UploadedFile};
