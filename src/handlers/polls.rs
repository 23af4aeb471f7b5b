// Poll handlers
// HTTP handlers behind the polls:index, polls:detail, polls:results and polls:vote routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    app::AppState,
    error::ApiError,
    models::{format_choice_line, Choice, Question},
};

/// Shown on the index page when nothing has been published yet
pub const NO_POLLS_MESSAGE: &str = "No polls are available.";

#[derive(Debug, Serialize)]
pub struct QuestionSummary {
    #[serde(flatten)]
    pub question: Question,
    pub was_published_recently: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub latest_question_list: Vec<QuestionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub question: Question,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub question: Question,
    pub results: Vec<String>,
}

/// List published questions, newest first
/// GET /polls/
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    info!("Fetching latest questions");

    let questions = state.repo.list_recent(now, state.polls.index_limit).await?;

    let message = questions.is_empty().then(|| NO_POLLS_MESSAGE.to_string());
    let latest_question_list: Vec<QuestionSummary> = questions
        .into_iter()
        .map(|question| QuestionSummary {
            was_published_recently: question.was_published_recently(now),
            question,
        })
        .collect();

    info!("Retrieved {} questions", latest_question_list.len());
    Ok((
        StatusCode::OK,
        Json(IndexResponse {
            latest_question_list,
            message,
        }),
    ))
}

/// Get a published question with its choices
/// GET /polls/:question_id/
pub async fn detail(
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    info!("Fetching question with id: {}", question_id);

    let question = state.repo.get_by_id(question_id).await?;

    // Future-dated questions are indistinguishable from missing ones
    if !question.is_published(now) {
        return Err(ApiError::not_found(format!("Question with id {}", question_id)));
    }

    let choices = state.repo.choices_for(question_id).await?;

    Ok((StatusCode::OK, Json(DetailResponse { question, choices })))
}

/// Get one vote line per choice of a question
/// GET /polls/:question_id/results/
pub async fn results(
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Fetching results for question with id: {}", question_id);

    let question = state.repo.get_by_id(question_id).await?;
    let results: Vec<String> = state
        .repo
        .choices_for(question_id)
        .await?
        .iter()
        .map(format_choice_line)
        .collect();

    Ok((StatusCode::OK, Json(ResultsResponse { question, results })))
}

/// Placeholder for casting a vote; records nothing
/// GET|POST /polls/:question_id/vote/
pub async fn vote(Path(question_id): Path<i32>) -> impl IntoResponse {
    info!("Vote requested for question with id: {}", question_id);
    (StatusCode::OK, format!("You are voting the question {}", question_id))
}
