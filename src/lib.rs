// Library root for the polls API

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;

// Re-export commonly used types
pub use app::{create_router, AppState};
pub use error::ApiError;
pub use models::{Choice, CreateChoiceRequest, CreateQuestionRequest, Question};
pub use repository::{Database, InMemoryRepository, PollRepository};
