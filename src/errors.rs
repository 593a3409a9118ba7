use thiserror::Error;

/// Failures of the response recovery pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("The AI response did not contain a valid JSON structure")]
    NoJsonFound,

    #[error("AI format error: {message}")]
    MalformedJson { message: String, fragment: String },

    #[error("The AI returned an empty question list")]
    EmptyQuiz,
}

/// Why a call to the completion service did not produce text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("No candidates returned from AI. This may be due to safety filters.")]
    SafetyFiltered,

    #[error("API rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected completion response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GenerationFailure),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid profile state: {0}")]
    InvalidProfileState(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Feedback relay failed: {0}")]
    RelayFailed(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Sanitize(SanitizeError::NoJsonFound) => "NO_JSON_FOUND",
            AppError::Sanitize(SanitizeError::MalformedJson { .. }) => "MALFORMED_JSON",
            AppError::Sanitize(SanitizeError::EmptyQuiz) => "EMPTY_QUIZ",
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            AppError::InvalidProfileState(_) => "INVALID_PROFILE_STATE",
            AppError::MissingCredential(_) => "MISSING_CREDENTIAL",
            AppError::InvalidCommand(_) => "INVALID_COMMAND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::RelayFailed(_) => "RELAY_FAILED",
        }
    }

    /// Text shown to the user before returning to the source selection screen.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Sanitize(err) => format!(
                "Error generating quiz: {}. Try again, or reduce the question count if this persists.",
                err
            ),
            AppError::GenerationFailed(GenerationFailure::Network(_)) => {
                "Network error: Could not reach the AI service.".to_string()
            }
            AppError::GenerationFailed(failure) => format!("Error generating quiz: {}", failure),
            AppError::ExtractionFailed(reason) => reason.clone(),
            AppError::MissingCredential(what) => {
                format!("{} is missing. Please check your .env file or the configuration.", what)
            }
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::StorageError(format!("JSON serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
