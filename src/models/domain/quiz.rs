use serde::Serialize;

use crate::errors::SanitizeError;
use crate::models::domain::quiz_question::QuizQuestion;

pub const DEFAULT_QUIZ_TITLE: &str = "Quiz";
const DERIVED_TITLE_WORDS: usize = 8;

/// A generated quiz. Always holds at least one question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quiz {
    title: String,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn new(title: impl Into<String>, questions: Vec<QuizQuestion>) -> Result<Self, SanitizeError> {
        if questions.is_empty() {
            return Err(SanitizeError::EmptyQuiz);
        }

        Ok(Quiz {
            title: title.into(),
            questions,
        })
    }

    /// Builds a quiz whose title falls back to the opening words of the first
    /// question, then to a generic placeholder.
    pub fn with_derived_title(
        title: Option<String>,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, SanitizeError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| questions.first().map(|q| derive_title(q.question())))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_QUIZ_TITLE.to_string());

        Quiz::new(title, questions)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

pub fn derive_title(question: &str) -> String {
    question
        .split_whitespace()
        .take(DERIVED_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> QuizQuestion {
        QuizQuestion::new(text, vec!["A".into(), "B".into()], 0, None).unwrap()
    }

    #[test]
    fn quiz_requires_questions() {
        assert_eq!(Quiz::new("Empty", vec![]), Err(SanitizeError::EmptyQuiz));
    }

    #[test]
    fn explicit_title_wins() {
        let quiz = Quiz::with_derived_title(Some(" Cells ".into()), vec![question("What?")]).unwrap();
        assert_eq!(quiz.title(), "Cells");
        assert_eq!(quiz.len(), 1);
    }

    #[test]
    fn title_is_derived_from_first_eight_words() {
        let quiz = Quiz::with_derived_title(
            Some("".into()),
            vec![question(
                "Which  organelle is known as the powerhouse of the eukaryotic cell?",
            )],
        )
        .unwrap();

        assert_eq!(quiz.title(), "Which organelle is known as the powerhouse of");
    }

    #[test]
    fn derive_title_handles_short_text() {
        assert_eq!(derive_title("Why?"), "Why?");
        assert_eq!(derive_title("   "), "");
    }
}
