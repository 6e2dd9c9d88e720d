//! Prometheus scrape endpoint

use axum::extract::State;
use crate::AppState;
use apit_common::errors::{AppError, Result};

pub async fn render(State(state): State<AppState>) -> Result<String> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::not_found("endpoint", "/metrics"))
}
