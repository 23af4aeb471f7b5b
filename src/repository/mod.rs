// Repository layer
// Storage-agnostic access to questions and choices

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::{
    error::ApiError,
    models::{Choice, CreateChoiceRequest, CreateQuestionRequest, Question},
};

pub use memory::InMemoryRepository;
pub use postgres::Database;

/// Persistence capability the handlers depend on.
///
/// Implementations own the storage; the recency and tally rules stay in
/// `crate::models` as pure functions.
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Questions published at or before `now`, newest first, truncated to `limit`
    async fn list_recent(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Question>, ApiError>;

    async fn get_by_id(&self, question_id: i32) -> Result<Question, ApiError>;

    /// Choices of a question in insertion order
    async fn choices_for(&self, question_id: i32) -> Result<Vec<Choice>, ApiError>;

    async fn create_question(&self, request: CreateQuestionRequest) -> Result<Question, ApiError>;

    async fn add_choice(
        &self,
        question_id: i32,
        request: CreateChoiceRequest,
    ) -> Result<Choice, ApiError>;

    /// Removes the question together with its choices
    async fn delete_question(&self, question_id: i32) -> Result<(), ApiError>;

    async fn count_questions(&self) -> Result<i64, ApiError>;

    async fn health_check(&self) -> Result<(), ApiError>;
}

/// Inserts a handful of sample polls when the store holds no questions yet.
pub async fn seed_sample_polls(repo: &dyn PollRepository, now: DateTime<Utc>) -> Result<(), ApiError> {
    let count = repo.count_questions().await?;
    if count > 0 {
        info!("Question table already contains {} entries, skipping seed", count);
        return Ok(());
    }

    let seed_data = [
        ("What's new?", Duration::hours(2), &["Not much", "The sky", "Just hacking again"][..]),
        ("Which is your favorite course?", Duration::days(3), &["Rust", "Databases", "Networking"][..]),
        ("Tabs or spaces?", Duration::days(10), &["Tabs", "Spaces"][..]),
    ];

    for (question_text, age, choices) in seed_data {
        let question = repo
            .create_question(CreateQuestionRequest {
                question_text: question_text.to_string(),
                pub_date: now - age,
            })
            .await?;

        for choice_text in choices {
            repo.add_choice(question.id, CreateChoiceRequest::new(*choice_text)).await?;
        }

        info!("Seeded question: {} ({} choices)", question.question_text, choices.len());
    }

    info!("Successfully seeded {} questions", seed_data.len());
    Ok(())
}
