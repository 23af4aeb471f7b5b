use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::info;

use super::PollRepository;
use crate::{
    error::ApiError,
    models::{latest_questions, Choice, CreateChoiceRequest, CreateQuestionRequest, Question},
};

/// Process-local store used by tests and by `POLLS_STORAGE=memory`.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    questions: BTreeMap<i32, Question>,
    choices: BTreeMap<i32, Choice>,
    next_question_id: i32,
    next_choice_id: i32,
}

impl State {
    fn allocate_question_id(&mut self) -> i32 {
        self.next_question_id += 1;
        self.next_question_id
    }

    fn allocate_choice_id(&mut self) -> i32 {
        self.next_choice_id += 1;
        self.next_choice_id
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn question_not_found(question_id: i32) -> ApiError {
    ApiError::NotFound(format!("Question with id {}", question_id))
}

#[async_trait]
impl PollRepository for InMemoryRepository {
    async fn list_recent(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Question>, ApiError> {
        let state = self.state.read().await;
        Ok(latest_questions(state.questions.values().cloned(), now, limit))
    }

    async fn get_by_id(&self, question_id: i32) -> Result<Question, ApiError> {
        let state = self.state.read().await;
        state
            .questions
            .get(&question_id)
            .cloned()
            .ok_or_else(|| question_not_found(question_id))
    }

    async fn choices_for(&self, question_id: i32) -> Result<Vec<Choice>, ApiError> {
        let state = self.state.read().await;
        Ok(state
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn create_question(&self, request: CreateQuestionRequest) -> Result<Question, ApiError> {
        request.validate().map_err(ApiError::Validation)?;

        let mut state = self.state.write().await;
        let question = Question {
            id: state.allocate_question_id(),
            question_text: request.get_normalized_question_text(),
            pub_date: request.pub_date,
        };
        state.questions.insert(question.id, question.clone());

        info!("Created question with id: {}", question.id);
        Ok(question)
    }

    async fn add_choice(
        &self,
        question_id: i32,
        request: CreateChoiceRequest,
    ) -> Result<Choice, ApiError> {
        request.validate().map_err(ApiError::Validation)?;

        let mut state = self.state.write().await;
        if !state.questions.contains_key(&question_id) {
            return Err(question_not_found(question_id));
        }

        let choice = Choice {
            id: state.allocate_choice_id(),
            question_id,
            choice_text: request.get_normalized_choice_text(),
            votes: request.votes,
        };
        state.choices.insert(choice.id, choice.clone());

        info!("Created choice with id: {} for question: {}", choice.id, question_id);
        Ok(choice)
    }

    async fn delete_question(&self, question_id: i32) -> Result<(), ApiError> {
        let mut state = self.state.write().await;
        if state.questions.remove(&question_id).is_none() {
            return Err(question_not_found(question_id));
        }

        let before = state.choices.len();
        state.choices.retain(|_, c| c.question_id != question_id);

        info!(
            "Deleted question with id: {} (cascade deleted {} choices)",
            question_id,
            before - state.choices.len()
        );
        Ok(())
    }

    async fn count_questions(&self) -> Result<i64, ApiError> {
        let state = self.state.read().await;
        Ok(state.questions.len() as i64)
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_request(text: &str, pub_date: DateTime<Utc>) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_text: text.to_string(),
            pub_date,
        }
    }

    #[tokio::test]
    async fn test_list_recent_with_no_questions() {
        let repo = InMemoryRepository::new();
        let latest = repo.list_recent(Utc::now(), None).await.unwrap();

        assert!(latest.is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_excludes_future_questions() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();

        repo.create_question(create_request("Past question.", now - Duration::days(30)))
            .await
            .unwrap();
        repo.create_question(create_request("Future question.", now + Duration::days(30)))
            .await
            .unwrap();

        let latest = repo.list_recent(now, None).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].question_text, "Past question.");
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();

        let a = repo
            .create_question(create_request("Past question 1.", now - Duration::days(30)))
            .await
            .unwrap();
        let b = repo
            .create_question(create_request("Past question 2.", now - Duration::days(5)))
            .await
            .unwrap();

        let latest = repo.list_recent(now, None).await.unwrap();
        assert_eq!(latest, vec![b, a]);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let repo = InMemoryRepository::new();
        let err = repo.get_by_id(42).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_question_rejects_long_text() {
        let repo = InMemoryRepository::new();
        let err = repo
            .create_question(create_request(&"q".repeat(201), Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(repo.count_questions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_choice_requires_existing_question() {
        let repo = InMemoryRepository::new();
        let err = repo
            .add_choice(1, CreateChoiceRequest::new("Orphan"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_choices_for_keeps_insertion_order() {
        let repo = InMemoryRepository::new();
        let question = repo
            .create_question(create_request("What's up?", Utc::now()))
            .await
            .unwrap();
        let other = repo
            .create_question(create_request("Other?", Utc::now()))
            .await
            .unwrap();

        repo.add_choice(question.id, CreateChoiceRequest::new("Not much")).await.unwrap();
        repo.add_choice(other.id, CreateChoiceRequest::new("Elsewhere")).await.unwrap();
        repo.add_choice(question.id, CreateChoiceRequest::new("The sky")).await.unwrap();

        let texts: Vec<String> = repo
            .choices_for(question.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.choice_text)
            .collect();
        assert_eq!(texts, vec!["Not much", "The sky"]);
    }

    #[test]
    fn test_delete_question_cascades_to_choices() {
        tokio_test::block_on(async {
            let repo = InMemoryRepository::new();
            let question = repo
                .create_question(create_request("What's up?", Utc::now()))
                .await
                .unwrap();
            repo.add_choice(question.id, CreateChoiceRequest::new("Not much")).await.unwrap();
            repo.add_choice(question.id, CreateChoiceRequest::new("The sky")).await.unwrap();

            repo.delete_question(question.id).await.unwrap();

            assert!(repo.choices_for(question.id).await.unwrap().is_empty());
            assert!(matches!(
                repo.get_by_id(question.id).await,
                Err(ApiError::NotFound(_))
            ));
            assert!(matches!(
                repo.delete_question(question.id).await,
                Err(ApiError::NotFound(_))
            ));
        });
    }
}
