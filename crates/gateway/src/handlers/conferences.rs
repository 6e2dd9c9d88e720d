//! Conference and topic handlers (organizer scope)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::services::{NewConference, NewTopic};
use crate::AppState;
use apit_common::{
    auth::{AuthContext, ORGANIZER_SCOPE},
    db::{models::Topic, ConferenceOverview},
    errors::Result,
};

pub async fn create_conference(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<NewConference>,
) -> Result<(StatusCode, Json<ConferenceOverview>)> {
    auth.require_scope(ORGANIZER_SCOPE)?;

    let overview = state.conferences.create(request).await?;
    Ok((StatusCode::CREATED, Json(overview)))
}

pub async fn current_conference(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ConferenceOverview>> {
    auth.require_scope(ORGANIZER_SCOPE)?;

    Ok(Json(state.conferences.current().await?))
}

pub async fn delete_conference(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_scope(ORGANIZER_SCOPE)?;

    state.conferences.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_topic(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(conference_id): Path<Uuid>,
    Json(request): Json<NewTopic>,
) -> Result<(StatusCode, Json<Topic>)> {
    auth.require_scope(ORGANIZER_SCOPE)?;

    let topic = state.conferences.add_topic(conference_id, request).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_scope(ORGANIZER_SCOPE)?;

    state.conferences.delete_topic(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::testing::Fixture;
    use apit_common::auth::ORGANIZER_SCOPE;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn request(fixture: &Fixture, method: &str, uri: String, scopes: &[&str], json: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, fixture.bearer(scopes));
        match json {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_organizer_scope_required() {
        let fixture = Fixture::new();
        let app = create_router(fixture.state());

        let response = app
            .oneshot(request(&fixture, "GET", "/conferences/current".into(), &[], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_conference() {
        let fixture = Fixture::new();
        let app = create_router(fixture.state());

        let body = r#"{
            "title": "Winter session",
            "date_start": "2030-01-10T09:00:00+02:00",
            "date_finish": "2030-01-12T18:00:00+02:00",
            "topics": ["Databases", "Compilers"]
        }"#;
        let response = app
            .oneshot(request(&fixture, "POST", "/conferences".into(), &[ORGANIZER_SCOPE], Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(fixture.gateway.topic_count(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_topic_conflicts() {
        let fixture = Fixture::new();
        let app = create_router(fixture.state());

        let body = format!(r#"{{"name": "{}"}}"#, fixture.topic.name);
        let uri = format!("/conferences/{}/topics", fixture.conference.id);
        let response = app
            .oneshot(request(&fixture, "POST", uri, &[ORGANIZER_SCOPE], Some(&body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_delete_topic() {
        let fixture = Fixture::new();
        let app = create_router(fixture.state());

        let uri = format!("/topics/{}", fixture.topic.id);
        let response = app
            .oneshot(request(&fixture, "DELETE", uri, &[ORGANIZER_SCOPE], None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(fixture.gateway.topic_count(), 0);
    }
}
