use schemars::JsonSchema;
use serde::Serialize;

/// A single multiple-choice question. The constructor enforces
/// `correct < options.len()`; once built the question is never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct: usize,
        explanation: Option<String>,
    ) -> Result<Self, String> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if options.len() < 2 {
            return Err(format!("expected at least 2 options, got {}", options.len()));
        }
        if correct >= options.len() {
            return Err(format!(
                "correct index {} is out of range for {} options",
                correct,
                options.len()
            ));
        }

        Ok(Self {
            question,
            options,
            correct,
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct
    }
}
