// Models module

pub mod choice;
pub mod question;

// Re-export commonly used types
pub use choice::{format_choice_line, Choice, CreateChoiceRequest};
pub use question::{latest_questions, was_published_recently, CreateQuestionRequest, Question};
