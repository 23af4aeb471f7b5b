use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length, in characters, of a question's text
pub const MAX_QUESTION_TEXT_LEN: usize = 200;

/// Question entity representing a poll prompt with its publication instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i32,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

/// Request structure for creating a new question
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

/// Whether `pub_date` falls inside the trailing one-day window ending at `now`.
///
/// Both bounds are inclusive. Callers sample the clock once and pass the same
/// `now` for every comparison made while serving a request.
pub fn was_published_recently(now: DateTime<Utc>, pub_date: DateTime<Utc>) -> bool {
    now - Duration::days(1) <= pub_date && pub_date <= now
}

/// Filters out questions published after `now` and orders the rest newest first.
///
/// Equal publication instants fall back to the id, higher ids first, so the
/// most recently inserted question wins a tie.
pub fn latest_questions<I>(questions: I, now: DateTime<Utc>, limit: Option<usize>) -> Vec<Question>
where
    I: IntoIterator<Item = Question>,
{
    let mut published: Vec<Question> = questions
        .into_iter()
        .filter(|q| q.is_published(now))
        .collect();

    published.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

    if let Some(limit) = limit {
        published.truncate(limit);
    }

    published
}

impl Question {
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        was_published_recently(now, self.pub_date)
    }

    /// A question is visible once its publication instant is not in the future
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.question_text)
    }
}

impl CreateQuestionRequest {
    /// Validate the create question request
    pub fn validate(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("Question text cannot be empty".to_string());
        }

        if self.question_text.chars().count() > MAX_QUESTION_TEXT_LEN {
            return Err(format!(
                "Question text cannot exceed {} characters",
                MAX_QUESTION_TEXT_LEN
            ));
        }

        Ok(())
    }

    /// Get normalized question text (trimmed)
    pub fn get_normalized_question_text(&self) -> String {
        self.question_text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i32, text: &str, pub_date: DateTime<Utc>) -> Question {
        Question {
            id,
            question_text: text.to_string(),
            pub_date,
        }
    }

    #[test]
    fn test_was_published_recently_with_future_question() {
        let now = Utc::now();
        let future = question(1, "Which is your favorite course?", now + Duration::days(30));

        assert!(!future.was_published_recently(now));
    }

    #[test]
    fn test_was_published_recently_with_old_question() {
        let now = Utc::now();
        let old = now - (Duration::days(1) + Duration::seconds(1));

        assert!(!was_published_recently(now, old));
    }

    #[test]
    fn test_was_published_recently_with_recent_question() {
        let now = Utc::now();
        let recent = now - (Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59));

        assert!(was_published_recently(now, recent));
    }

    #[test]
    fn test_was_published_recently_boundaries_are_inclusive() {
        let now = DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(was_published_recently(now, now));
        assert!(was_published_recently(now, now - Duration::days(1)));
        assert!(!was_published_recently(now, now - Duration::days(1) - Duration::nanoseconds(1)));
        assert!(!was_published_recently(now, now + Duration::nanoseconds(1)));
    }

    #[test]
    fn test_latest_questions_excludes_future_and_orders_descending() {
        let now = Utc::now();
        let questions = vec![
            question(1, "Past question 1.", now - Duration::days(30)),
            question(2, "Future question.", now + Duration::days(30)),
            question(3, "Past question 2.", now - Duration::days(5)),
        ];

        let latest = latest_questions(questions, now, None);
        let texts: Vec<&str> = latest.iter().map(|q| q.question_text.as_str()).collect();

        assert_eq!(texts, vec!["Past question 2.", "Past question 1."]);
    }

    #[test]
    fn test_latest_questions_breaks_ties_by_id() {
        let now = Utc::now();
        let pub_date = now - Duration::hours(1);
        let questions = vec![question(1, "A", pub_date), question(2, "B", pub_date)];

        let latest = latest_questions(questions, now, None);

        assert_eq!(latest[0].id, 2);
        assert_eq!(latest[1].id, 1);
    }

    #[test]
    fn test_latest_questions_applies_limit() {
        let now = Utc::now();
        let questions = (1..=7).map(|i| question(i, "Q", now - Duration::days(i as i64)));

        let latest = latest_questions(questions, now, Some(5));

        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].id, 1);
    }

    #[test]
    fn test_question_displays_as_text() {
        let q = question(1, "What's up?", Utc::now());
        assert_eq!(q.to_string(), "What's up?");
    }

    #[test]
    fn test_create_question_request_validation() {
        let valid = CreateQuestionRequest {
            question_text: "What's new?".to_string(),
            pub_date: Utc::now(),
        };
        assert!(valid.validate().is_ok());

        let empty = CreateQuestionRequest {
            question_text: "   ".to_string(),
            pub_date: Utc::now(),
        };
        assert!(empty.validate().is_err());

        let at_limit = CreateQuestionRequest {
            question_text: "あ".repeat(200),
            pub_date: Utc::now(),
        };
        assert!(at_limit.validate().is_ok());

        let too_long = CreateQuestionRequest {
            question_text: "a".repeat(201),
            pub_date: Utc::now(),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_question_serialization() {
        let q = question(
            1,
            "What's new?",
            DateTime::parse_from_rfc3339("2022-01-01T00:00:00Z").unwrap().with_timezone(&Utc),
        );

        let json = serde_json::to_string(&q).expect("Failed to serialize question");
        let expected = r#"{"id":1,"question_text":"What's new?","pub_date":"2022-01-01T00:00:00Z"}"#;
        assert_eq!(json, expected);
    }
}
