use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::domain::quiz_attempt::build_review;
use crate::models::domain::{AnswerRecord, Quiz, QuizQuestion, ResultSummary, ReviewEntry};

/// Input from the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    SelectAnswer(usize),
    Skip,
    Advance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// A selection was recorded; carries what instant feedback needs.
    AnswerRecorded {
        option: usize,
        correct: bool,
        correct_option: usize,
    },
    Moved {
        index: usize,
    },
    Completed(ResultSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InProgress,
    Complete,
}

/// Progress through one quiz. `current_index == quiz.len()` means finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSessionState {
    quiz: Quiz,
    current_index: usize,
    answers: Vec<AnswerRecord>,
    elapsed_seconds: u64,
}

impl QuizSessionState {
    pub fn new(quiz: Quiz) -> Self {
        let answers = vec![AnswerRecord::Unanswered; quiz.len()];
        QuizSessionState {
            quiz,
            current_index: 0,
            answers,
            elapsed_seconds: 0,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.quiz.len()
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.quiz.question(self.current_index)
    }

    pub fn current_answer(&self) -> Option<AnswerRecord> {
        self.answers.get(self.current_index).copied()
    }

    /// Records a choice for the current question. Choosing again before
    /// advancing replaces the earlier choice.
    pub fn select_answer(&mut self, option: usize) -> AppResult<SessionEvent> {
        let question = self
            .current_question()
            .ok_or_else(|| AppError::InvalidCommand("quiz is already complete".to_string()))?;

        if option >= question.options().len() {
            return Err(AppError::InvalidCommand(format!(
                "option {} does not exist, question has {} options",
                option,
                question.options().len()
            )));
        }

        let correct = question.is_correct(option);
        let correct_option = question.correct();
        self.answers[self.current_index] = AnswerRecord::Selected(option);

        Ok(SessionEvent::AnswerRecorded {
            option,
            correct,
            correct_option,
        })
    }

    pub fn skip(&mut self) -> AppResult<SessionEvent> {
        if self.is_complete() {
            return Err(AppError::InvalidCommand("quiz is already complete".to_string()));
        }

        self.answers[self.current_index] = AnswerRecord::Skipped;
        self.advance()
    }

    pub fn advance(&mut self) -> AppResult<SessionEvent> {
        match self.current_answer() {
            None => Err(AppError::InvalidCommand("quiz is already complete".to_string())),
            Some(AnswerRecord::Unanswered) => Err(AppError::InvalidCommand(format!(
                "question {} has not been answered or skipped",
                self.current_index + 1
            ))),
            Some(_) => {
                self.current_index += 1;
                if self.is_complete() {
                    Ok(SessionEvent::Completed(self.summarize()))
                } else {
                    Ok(SessionEvent::Moved {
                        index: self.current_index,
                    })
                }
            }
        }
    }

    pub fn apply(&mut self, command: SessionCommand) -> AppResult<SessionEvent> {
        match command {
            SessionCommand::SelectAnswer(option) => self.select_answer(option),
            SessionCommand::Skip => self.skip(),
            SessionCommand::Advance => self.advance(),
        }
    }

    fn summarize(&self) -> ResultSummary {
        ResultSummary::from_answers(&self.quiz, &self.answers)
    }
}

#[derive(Debug, Clone, Default)]
enum SessionState {
    #[default]
    Idle,
    InProgress(QuizSessionState),
    Complete {
        state: QuizSessionState,
        summary: ResultSummary,
    },
}

/// The single quiz session owned by the front end.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    state: SessionState,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `quiz`, discarding whatever ran before.
    pub fn start(&mut self, quiz: Quiz) {
        log::info!("Starting quiz '{}' ({} questions)", quiz.title(), quiz.len());
        self.state = SessionState::InProgress(QuizSessionState::new(quiz));
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::InProgress(_) => SessionPhase::InProgress,
            SessionState::Complete { .. } => SessionPhase::Complete,
        }
    }

    pub fn state(&self) -> Option<&QuizSessionState> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::InProgress(state) => Some(state),
            SessionState::Complete { state, .. } => Some(state),
        }
    }

    pub fn dispatch(&mut self, command: SessionCommand) -> AppResult<SessionEvent> {
        let SessionState::InProgress(state) = &mut self.state else {
            return Err(AppError::InvalidCommand(format!(
                "{:?} is only valid while a quiz is in progress",
                command
            )));
        };

        let event = state.apply(command)?;

        if let SessionEvent::Completed(summary) = &event {
            let summary = *summary;
            if let SessionState::InProgress(state) = std::mem::take(&mut self.state) {
                log::info!(
                    "Quiz complete: {}% ({} correct, {} incorrect, {} skipped) in {}",
                    summary.percent,
                    summary.correct_count,
                    summary.incorrect_count,
                    summary.skipped_count,
                    format_elapsed(state.elapsed_seconds())
                );
                self.state = SessionState::Complete { state, summary };
            }
        }

        Ok(event)
    }

    /// One second of the cosmetic timer. Frozen outside `InProgress`.
    pub fn tick(&mut self) {
        if let SessionState::InProgress(state) = &mut self.state {
            state.elapsed_seconds += 1;
        }
    }

    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.state().map_or(0, QuizSessionState::elapsed_seconds))
    }

    pub fn progress_percent(&self) -> u8 {
        match &self.state {
            SessionState::Idle => 0,
            SessionState::InProgress(state) => {
                (100 * state.current_index() / state.quiz().len()) as u8
            }
            SessionState::Complete { .. } => 100,
        }
    }

    pub fn summary(&self) -> Option<ResultSummary> {
        match &self.state {
            SessionState::Complete { summary, .. } => Some(*summary),
            _ => None,
        }
    }

    pub fn review(&self) -> Option<Vec<ReviewEntry>> {
        match &self.state {
            SessionState::Complete { state, .. } => Some(build_review(state.quiz(), state.answers())),
            _ => None,
        }
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
