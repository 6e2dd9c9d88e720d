//! Article handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::services::{ArticleDetails, ArticleForm, ComposeForm, UploadedFile};
use crate::AppState;
use apit_common::{
    auth::AuthContext,
    errors::{AppError, Result},
};

/// Where authors land when nothing can be submitted
pub const ACCOUNT_PAGE: &str = "/account/index";

/// Landing page after an inline submission
pub const ARTICLE_LIST_PAGE: &str = "/articles/list";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Only same-site paths are followed after a delete
pub fn safe_return_url(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => url,
        _ => "/",
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidFormat {
        message: format!("Malformed multipart body: {}", e),
    }
}

async fn read_article_form(mut multipart: Multipart) -> Result<ArticleForm> {
    let mut form = ArticleForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await.map_err(multipart_error)?,
            "short_description" => {
                form.short_description = field.text().await.map_err(multipart_error)?
            }
            "topic_id" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.topic_id = Some(value).filter(|v| !v.trim().is_empty());
            }
            "key_words" => form.key_words = field.text().await.map_err(multipart_error)?,
            "doc_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let contents = field.bytes().await.map_err(multipart_error)?;
                form.doc_file = Some(UploadedFile {
                    file_name,
                    contents: contents.to_vec(),
                });
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Submission form data, or a redirect when nothing accepts articles
pub async fn create_form(State(state): State<AppState>, _auth: AuthContext) -> Result<Response> {
    match state.articles.submission_target().await? {
        Some(current) => Ok(Json(current).into_response()),
        None => Ok(Redirect::to(ACCOUNT_PAGE).into_response()),
    }
}

/// Upload a Word document as a new article
pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = read_article_form(multipart).await?;
    let article = state.articles.submit(&auth, form).await?;

    Ok(Redirect::to(&format!(
        "/articles/index?id={}",
        article.unique_address
    )))
}

/// Submit an article typed in the inline editor
pub async fn compose(
    State(state): State<AppState>,
    auth: AuthContext,
    Form(form): Form<ComposeForm>,
) -> Result<Redirect> {
    state.articles.compose(&auth, form).await?;
    Ok(Redirect::to(ARTICLE_LIST_PAGE))
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<ArticleDetails>> {
    let address = query
        .id
        .ok_or_else(|| AppError::not_found("article", "<missing>"))?;
    Ok(Json(state.articles.by_address(&address).await?))
}

pub async fn edit_view(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ArticleDetails>> {
    Ok(Json(state.articles.edit_view(Some(&id)).await?))
}

/// `GET /articles/edit` without an id
pub async fn edit_view_missing_id(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ArticleDetails>> {
    Ok(Json(state.articles.edit_view(None).await?))
}

pub async fn edit_submit(State(state): State<AppState>, auth: AuthContext) -> Result<Response> {
    state.articles.edit_submit(&auth).await?;
    Ok(Redirect::to(ARTICLE_LIST_PAGE).into_response())
}

/// Delete an article; always redirects, failures are only logged
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Redirect {
    match state.articles.delete(&auth, &id).await {
        Ok(()) => {}
        Err(AppError::Form(errors)) => {
            warn!(article_id = %id, errors = %errors, "Article not deleted");
        }
        Err(e) => {
            error!(article_id = %id, error = %e, "Article delete failed");
        }
    }

    Redirect::to(safe_return_url(query.return_url.as_deref()))
}
