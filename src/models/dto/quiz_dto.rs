use schemars::JsonSchema;
use serde::Serialize;

use crate::models::domain::{Quiz, QuizQuestion};

/// The JSON shape the completion service is asked to produce.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QuizPayload {
    pub quiz_title: String,
    pub questions: Vec<QuizQuestion>,
}

impl From<&Quiz> for QuizPayload {
    fn from(quiz: &Quiz) -> Self {
        QuizPayload {
            quiz_title: quiz.title().to_string(),
            questions: quiz.questions().to_vec(),
        }
    }
}

pub fn quiz_payload_schema() -> String {
    let schema = schemars::schema_for!(QuizPayload);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::five_question_quiz;

    #[test]
    fn payload_mirrors_quiz() {
        let quiz = five_question_quiz();
        let payload = QuizPayload::from(&quiz);

        assert_eq!(payload.quiz_title, quiz.title());
        assert_eq!(payload.questions.len(), 5);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["questions"][0]["options"].is_array());
    }

    #[test]
    fn schema_names_expected_fields() {
        let schema = quiz_payload_schema();

        assert!(schema.contains("quiz_title"));
        assert!(schema.contains("questions"));
        assert!(schema.contains("correct"));
    }
}
