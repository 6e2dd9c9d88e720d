//! Article Assembler
//!
//! Builds the article aggregate handed to the persistence gateway. Pure: no
//! I/O happens here.

use apit_common::db::models::{Article, ArticleStatus, Conference, Topic, User, UserOwnArticlesLinking};
use apit_common::db::ArticleGraph;
use apit_ingestion::DocumentPaths;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// Validated article fields awaiting assembly
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub short_description: String,
    /// Already joined with the keyword separator
    pub key_words: String,
    pub unique_address: String,
    pub paths: DocumentPaths,
}

/// Assemble a new article with the submitting user as its only author
pub fn assemble_article(
    draft: ArticleDraft,
    topic: &Topic,
    conference: &Conference,
    author: &User,
    now: DateTime<FixedOffset>,
) -> ArticleGraph {
    let article_id = Uuid::new_v4();

    let authors = vec![UserOwnArticlesLinking {
        id: Uuid::new_v4(),
        user_id: author.id,
        article_id,
    }];

    let article = Article {
        id: article_id,
        unique_address: draft.unique_address,
        title: draft.title,
        short_description: draft.short_description,
        key_words: draft.key_words,
        status: ArticleStatus::Uploaded.into(),
        html_file_path: draft.paths.html_file,
        docx_file_path: draft.paths.original_file,
        topic_id: topic.id,
        conference_id: conference.id,
        date_created: now,
        date_last_modified: now,
    };

    ArticleGraph {
        article,
        authors,
        new_topic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_conference, sample_topic, sample_user};

    #[test]
    fn test_assembled_graph_is_consistent() {
        let conference = sample_conference();
        let topic = sample_topic(&conference, "Databases");
        let user = sample_user();
        let now = chrono::Utc::now().fixed_offset();

        let draft = ArticleDraft {
            title: "Log-structured merge trees".to_string(),
            short_description: "A survey".to_string(),
            key_words: "lsm;storage".to_string(),
            unique_address: "q1w2e3r4t5y6u7i8".to_string(),
            paths: DocumentPaths::for_upload("q1w2e3r4t5y6u7i8", ".docx"),
        };

        let graph = assemble_article(draft, &topic, &conference, &user, now);

        assert_eq!(graph.authors.len(), 1);
        assert!(graph.new_topic.is_none());
        assert_eq!(graph.authors[0].user_id, user.id);
        assert_eq!(graph.authors[0].article_id, graph.article.id);

        let article = &graph.article;
        assert_eq!(article.topic_id, topic.id);
        assert_eq!(article.conference_id, conference.id);
        assert_eq!(article.date_created, article.date_last_modified);
        assert_eq!(article.article_status(), ArticleStatus::Uploaded);
        assert_eq!(article.html_file_path, "q1w2e3r4t5y6u7i8.htm");
        assert_eq!(article.docx_file_path.as_deref(), Some("q1w2e3r4t5y6u7i8.docx"));
    }

    #[test]
    fn test_fresh_identity_per_assembly() {
        let conference = sample_conference();
        let topic = sample_topic(&conference, "Networks");
        let user = sample_user();
        let now = chrono::Utc::now().fixed_offset();
        let draft = ArticleDraft {
            title: "t".to_string(),
            short_description: "d".to_string(),
            key_words: String::new(),
            unique_address: "a".to_string(),
            paths: DocumentPaths::for_inline("a"),
        };

        let first = assemble_article(draft.clone(), &topic, &conference, &user, now);
        let second = assemble_article(draft, &topic, &conference, &user, now);
        assert_ne!(first.article.id, second.article.id);
        assert_eq!(first.article.docx_file_path, None);
    }
}
