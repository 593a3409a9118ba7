pub mod profile;
pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub use profile::{PlayerProfile, ProfileCollection};
pub use quiz::Quiz;
pub use quiz_attempt::{AnswerRecord, ResultSummary, ReviewEntry, ReviewStatus};
pub use quiz_question::QuizQuestion;
