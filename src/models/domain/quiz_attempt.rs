use serde::Serialize;

use crate::models::domain::quiz::Quiz;

pub const XP_PER_CORRECT_ANSWER: u32 = 10;
pub const PERFECT_SCORE_BONUS_XP: u32 = 50;

/// What the user did with one question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "option", rename_all = "lowercase")]
pub enum AnswerRecord {
    Unanswered,
    Selected(usize),
    Skipped,
}

impl AnswerRecord {
    pub fn is_recorded(&self) -> bool {
        !matches!(self, AnswerRecord::Unanswered)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub skipped_count: usize,
    pub percent: u8,
    pub xp_awarded: u32,
}

impl ResultSummary {
    /// Scores a finished attempt. Anything that is neither correct nor skipped
    /// counts as incorrect.
    pub fn from_answers(quiz: &Quiz, answers: &[AnswerRecord]) -> Self {
        let total = quiz.len();
        let correct_count = quiz
            .questions()
            .iter()
            .zip(answers)
            .filter(|(q, a)| matches!(a, AnswerRecord::Selected(i) if q.is_correct(*i)))
            .count();
        let skipped_count = answers
            .iter()
            .filter(|a| matches!(a, AnswerRecord::Skipped))
            .count();
        let incorrect_count = total.saturating_sub(correct_count + skipped_count);

        let percent = if total == 0 {
            0
        } else {
            ((100.0 * correct_count as f64) / total as f64).round() as u8
        };

        let bonus = if percent == 100 { PERFECT_SCORE_BONUS_XP } else { 0 };
        let xp_awarded = XP_PER_CORRECT_ANSWER * correct_count as u32 + bonus;

        ResultSummary {
            correct_count,
            incorrect_count,
            skipped_count,
            percent,
            xp_awarded,
        }
    }

    pub fn total(&self) -> usize {
        self.correct_count + self.incorrect_count + self.skipped_count
    }

    pub fn message(&self) -> &'static str {
        result_message(self.percent)
    }
}

pub fn result_message(percent: u8) -> &'static str {
    if percent >= 100 {
        "Perfect! You've mastered this topic!"
    } else if percent >= 80 {
        "Impressive! You have a very strong grasp of these concepts."
    } else if percent >= 60 {
        "Good job! You're on the right track, just a few things to polish."
    } else if percent >= 40 {
        "Not bad, but there's room for improvement. Keep studying!"
    } else {
        "Keep practicing! Review the explanations below to improve your score."
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Right,
    Wrong,
    Skipped,
}

/// One line of the post-quiz review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub number: usize,
    pub question: String,
    pub status: ReviewStatus,
    pub correct_answer: String,
    pub chosen_answer: Option<String>,
    pub explanation: Option<String>,
}

pub fn build_review(quiz: &Quiz, answers: &[AnswerRecord]) -> Vec<ReviewEntry> {
    quiz.questions()
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(index, (question, answer))| {
            let (status, chosen_answer) = match answer {
                AnswerRecord::Selected(i) if question.is_correct(*i) => {
                    (ReviewStatus::Right, question.option(*i).map(str::to_string))
                }
                AnswerRecord::Selected(i) => {
                    (ReviewStatus::Wrong, question.option(*i).map(str::to_string))
                }
                AnswerRecord::Skipped => (ReviewStatus::Skipped, None),
                AnswerRecord::Unanswered => (ReviewStatus::Wrong, None),
            };

            ReviewEntry {
                number: index + 1,
                question: question.question().to_string(),
                status,
                correct_answer: question.correct_option().to_string(),
                chosen_answer,
                explanation: question.explanation().map(str::to_string),
            }
        })
        .collect()
}
