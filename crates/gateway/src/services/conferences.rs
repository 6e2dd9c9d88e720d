//! Conference and topic management for organizers

use apit_common::db::models::{Conference, Topic};
use apit_common::db::{random_address, ConferenceOverview, DataGateway};
use apit_common::errors::{AppError, FieldErrors, Result};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

fn default_actual() -> bool {
    true
}

/// New conference with the names of its initial topics
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewConference {
    #[validate(length(min = 1, max = 512, message = "title is required"))]
    pub title: String,

    pub short_description: Option<String>,

    pub description: Option<String>,

    #[serde(default = "default_actual")]
    pub is_actual: bool,

    pub date_start: DateTime<FixedOffset>,

    pub date_finish: DateTime<FixedOffset>,

    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTopic {
    #[validate(length(min = 1, max = 256, message = "topic name is required"))]
    pub name: String,
}

pub struct ConferenceService {
    gateway: Arc<dyn DataGateway>,
}

impl ConferenceService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Create a conference and its topics in one write
    pub async fn create(&self, request: NewConference) -> Result<ConferenceOverview> {
        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if request.date_finish < request.date_start {
            errors.add("date_finish", "conference cannot finish before it starts");
        }
        errors.into_result()?;

        let now = chrono::Utc::now().fixed_offset();
        let conference = Conference {
            id: Uuid::new_v4(),
            unique_address: random_address(),
            is_actual: request.is_actual,
            title: request.title.trim().to_string(),
            short_description: request.short_description,
            description: request.description,
            date_created: now,
            date_last_modified: now,
            date_start: request.date_start,
            date_finish: request.date_finish,
        };

        let mut names: Vec<String> = request
            .topics
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();

        let topics: Vec<Topic> = names
            .into_iter()
            .map(|name| Topic {
                id: Uuid::new_v4(),
                name,
                conference_id: conference.id,
            })
            .collect();

        self.gateway
            .create_conference(conference.clone(), topics.clone())
            .await?;

        info!(
            conference_id = %conference.id,
            topics = topics.len(),
            "Conference created"
        );

        Ok(ConferenceOverview {
            conference,
            topics,
            participant_count: 0,
            images: Vec::new(),
        })
    }

    /// The conference currently accepting submissions
    pub async fn current(&self) -> Result<ConferenceOverview> {
        let current = self
            .gateway
            .current_conference()
            .await?
            .ok_or_else(|| AppError::not_found("conference", "current"))?;

        let id = current.conference.id;
        self.gateway
            .conference_overview(id)
            .await?
            .ok_or_else(|| AppError::not_found("conference", id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.gateway.conference_exists(id).await? {
            return Err(AppError::not_found("conference", id));
        }

        self.gateway.delete_conference(id).await?;
        info!(conference_id = %id, "Conference deleted");
        Ok(())
    }

    pub async fn add_topic(&self, conference_id: Uuid, request: NewTopic) -> Result<Topic> {
        if let Err(e) = request.validate() {
            return Err(AppError::Form(e.into()));
        }

        if !self.gateway.conference_exists(conference_id).await? {
            return Err(AppError::not_found("conference", conference_id));
        }

        let name = request.name.trim();
        if self
            .gateway
            .find_topic_by_name(conference_id, name)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate {
                message: format!("topic '{}' already exists in this conference", name),
            });
        }

        let topic = Topic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            conference_id,
        };
        self.gateway.create_topic(topic.clone()).await?;

        info!(topic_id = %topic.id, conference_id = %conference_id, "Topic added");
        Ok(topic)
    }

    /// Remove a topic no article points at
    pub async fn delete_topic(&self, id: Uuid) -> Result<()> {
        if !self.gateway.topic_exists(id).await? {
            return Err(AppError::not_found("topic", id));
        }
        if self.gateway.topic_in_use(id).await? {
            return Err(AppError::Conflict {
                message: "topic is referenced by submitted articles".to_string(),
            });
        }

        self.gateway.delete_topic(id).await?;
        info!(topic_id = %id, "Topic deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::form::{ArticleForm, UploadedFile};
    use crate::testing::{auth_for, Fixture};
    use apit_common::db::models::{ConferenceImage, ConferenceParticipant};

    fn new_conference(topics: &[&str]) -> NewConference {
        let start = chrono::Utc::now().fixed_offset() + chrono::Duration::days(30);
        NewConference {
            title: "Autumn session".to_string(),
            short_description: Some("Applied informatics".to_string()),
            description: None,
            is_actual: true,
            date_start: start,
            date_finish: start + chrono::Duration::days(2),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_conference_with_topics() {
        let fixture = Fixture::new();
        let service = fixture.conferences();

        let overview = service
            .create(new_conference(&["Security", " Networks ", "Security", ""]))
            .await
            .unwrap();

        let names: Vec<_> = overview.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Networks", "Security"]);
        assert!(overview
            .topics
            .iter()
            .all(|t| t.conference_id == overview.conference.id));

        // Starts later than the seeded conference, so it becomes current
        let current = service.current().await.unwrap();
        assert_eq!(current.conference, overview.conference);
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_dates() {
        let fixture = Fixture::new();
        let mut request = new_conference(&[]);
        std::mem::swap(&mut request.date_start, &mut request.date_finish);

        let err = fixture.conferences().create(request).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains("date_finish"));
        assert_eq!(fixture.gateway.writes(), 0);
    }

    #[tokio::test]
    async fn test_current_overview_counts_owned_rows() {
        let fixture = Fixture::new();
        fixture.gateway.insert_participant(ConferenceParticipant {
            id: Uuid::new_v4(),
            conference_id: fixture.conference.id,
            user_id: fixture.user.id,
            date_joined: chrono::Utc::now().fixed_offset(),
        });
        fixture.gateway.insert_image(ConferenceImage {
            id: Uuid::new_v4(),
            conference_id: fixture.conference.id,
            file_path: "banner.png".to_string(),
        });

        let overview = fixture.conferences().current().await.unwrap();
        assert_eq!(overview.participant_count, 1);
        assert_eq!(overview.images.len(), 1);
        assert_eq!(overview.topics, vec![fixture.topic.clone()]);
    }

    #[tokio::test]
    async fn test_delete_conference() {
        let fixture = Fixture::new();
        let service = fixture.conferences();

        service.delete(fixture.conference.id).await.unwrap();
        assert_eq!(fixture.gateway.topic_count(), 0);

        let err = service.delete(fixture.conference.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(matches!(service.current().await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_topic() {
        let fixture = Fixture::new();
        let service = fixture.conferences();

        let topic = service
            .add_topic(fixture.conference.id, NewTopic { name: "Compilers".to_string() })
            .await
            .unwrap();
        assert_eq!(topic.conference_id, fixture.conference.id);

        let err = service
            .add_topic(fixture.conference.id, NewTopic { name: fixture.topic.name.clone() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));

        let err = service
            .add_topic(Uuid::new_v4(), NewTopic { name: "Orphan".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let err = service
            .add_topic(fixture.conference.id, NewTopic { name: String::new() })
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_delete_topic_in_use() {
        let fixture = Fixture::new();
        let form = ArticleForm {
            title: "Paper".to_string(),
            short_description: "Abstract".to_string(),
            topic_id: Some(fixture.topic.id.to_string()),
            key_words: "x".to_string(),
            doc_file: Some(UploadedFile {
                file_name: "p.docx".to_string(),
                contents: b"doc".to_vec(),
            }),
        };
        fixture
            .articles()
            .submit(&auth_for(&fixture.user), form)
            .await
            .unwrap();

        let err = fixture.conferences().delete_topic(fixture.topic.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let err = fixture.conferences().delete_topic(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
