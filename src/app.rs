use axum::{routing::get, Router};
use std::{sync::Arc, time::Duration};

use crate::{
    config::PollsConfig,
    handlers::{
        health_check,
        polls::{detail, index, results, vote},
    },
    middleware::create_middleware_stack,
    repository::PollRepository,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PollRepository>,
    pub polls: PollsConfig,
}

impl AppState {
    pub fn new(repo: Arc<dyn PollRepository>, polls: PollsConfig) -> Self {
        Self { repo, polls }
    }
}

/// Create the Axum router with all endpoints and middleware
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // polls:index, polls:detail, polls:results, polls:vote
        .route("/polls/", get(index))
        .route("/polls/:question_id/", get(detail))
        .route("/polls/:question_id/results/", get(results))
        .route("/polls/:question_id/vote/", get(vote).post(vote))
        .with_state(state)
        .layer(create_middleware_stack(request_timeout))
}
