// Handlers module
// HTTP handlers for the polls API

pub mod polls;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{app::AppState, error::ApiError};

/// Health check handler
/// Returns "OK" with 200 status once the storage backend answers
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.repo.health_check().await?;
    Ok((StatusCode::OK, "OK"))
}
