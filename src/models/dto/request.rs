use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub const MAX_QUESTION_COUNT: u8 = 30;

/// An image sent alongside the prompt, already base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub base64_data: String,
}

/// Where the study material comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSource {
    Text(String),
    File(PathBuf),
    Url(String),
    ImageFile(PathBuf),
    ImageDataUrl(String),
}

impl QuizSource {
    pub fn is_image(&self) -> bool {
        matches!(self, QuizSource::ImageFile(_) | QuizSource::ImageDataUrl(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QuizSource::Text(_) => "text",
            QuizSource::File(_) => "file",
            QuizSource::Url(_) => "url",
            QuizSource::ImageFile(_) | QuizSource::ImageDataUrl(_) => "image",
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct GenerateQuizRequest {
    pub source: QuizSource,

    #[validate(range(min = 1, max = 30))]
    pub question_count: u8,

    #[validate(length(min = 1, max = 50))]
    pub language: String,

    /// API key typed into the front end, used when the environment has none.
    pub api_key: Option<String>,
}

impl GenerateQuizRequest {
    pub fn new(source: QuizSource, question_count: u8, language: impl Into<String>) -> Self {
        Self {
            source,
            question_count,
            language: language.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FeedbackRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}
