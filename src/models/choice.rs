use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length, in characters, of a choice's text
pub const MAX_CHOICE_TEXT_LEN: usize = 200;

/// Choice entity representing one answer to a question and its vote count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: i32,
    pub question_id: i32,
    pub choice_text: String,
    pub votes: i32,
}

/// Request structure for adding a choice to a question
#[derive(Debug, Deserialize)]
pub struct CreateChoiceRequest {
    pub choice_text: String,
    #[serde(default)]
    pub votes: i32,
}

/// Renders a choice as a results line, e.g. `"Choice 1 -- 1 vote"`.
pub fn format_choice_line(choice: &Choice) -> String {
    let unit = if choice.votes == 1 { "vote" } else { "votes" };
    format!("{} -- {} {}", choice.choice_text, choice.votes, unit)
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.choice_text)
    }
}

impl CreateChoiceRequest {
    pub fn new(choice_text: impl Into<String>) -> Self {
        Self {
            choice_text: choice_text.into(),
            votes: 0,
        }
    }

    /// Validate the create choice request
    pub fn validate(&self) -> Result<(), String> {
        if self.choice_text.trim().is_empty() {
            return Err("Choice text cannot be empty".to_string());
        }

        if self.choice_text.chars().count() > MAX_CHOICE_TEXT_LEN {
            return Err(format!(
                "Choice text cannot exceed {} characters",
                MAX_CHOICE_TEXT_LEN
            ));
        }

        if self.votes < 0 {
            return Err("Votes cannot be negative".to_string());
        }

        Ok(())
    }

    /// Get normalized choice text (trimmed)
    pub fn get_normalized_choice_text(&self) -> String {
        self.choice_text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(text: &str, votes: i32) -> Choice {
        Choice {
            id: 1,
            question_id: 1,
            choice_text: text.to_string(),
            votes,
        }
    }

    #[test]
    fn test_format_choice_line_singular() {
        assert_eq!(format_choice_line(&choice("Choice 1", 1)), "Choice 1 -- 1 vote");
    }

    #[test]
    fn test_format_choice_line_plural() {
        assert_eq!(format_choice_line(&choice("Choice 2", 10)), "Choice 2 -- 10 votes");
        assert_eq!(format_choice_line(&choice("Choice 3", 0)), "Choice 3 -- 0 votes");
    }

    #[test]
    fn test_choice_displays_as_text() {
        assert_eq!(choice("Not much", 3).to_string(), "Not much");
    }

    #[test]
    fn test_create_choice_request_defaults_votes_to_zero() {
        let request: CreateChoiceRequest = serde_json::from_str(r#"{"choice_text":"The sky"}"#)
            .expect("Failed to deserialize CreateChoiceRequest");

        assert_eq!(request.choice_text, "The sky");
        assert_eq!(request.votes, 0);
    }

    #[test]
    fn test_create_choice_request_validation() {
        assert!(CreateChoiceRequest::new("Not much").validate().is_ok());
        assert!(CreateChoiceRequest::new("").validate().is_err());
        assert!(CreateChoiceRequest::new("a".repeat(201)).validate().is_err());

        let negative = CreateChoiceRequest {
            choice_text: "Not much".to_string(),
            votes: -1,
        };
        assert!(negative.validate().is_err());
    }
}
