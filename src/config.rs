use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_proxy_url: Option<String>,
    pub question_count: u8,
    pub language: String,
    pub max_output_tokens: u32,
    pub store_path: String,
    pub content_fetch_base_url: String,
    pub formspree_id: Option<String>,
    pub formspree_base_url: String,
    pub http_timeout_seconds: u64,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY").map(SecretString::from),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1".to_string()),
            gemini_proxy_url: non_empty_var("GEMINI_PROXY_URL"),
            question_count: env::var("QUIZ_QUESTION_COUNT")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(5),
            language: env::var("QUIZ_LANGUAGE").unwrap_or_else(|_| "French".to_string()),
            max_output_tokens: env::var("QUIZ_MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(2048),
            store_path: env::var("QUIZ_STORE_PATH")
                .unwrap_or_else(|_| "quizify_store.json".to_string()),
            content_fetch_base_url: env::var("CONTENT_FETCH_BASE_URL")
                .unwrap_or_else(|_| "https://r.jina.ai/".to_string()),
            formspree_id: non_empty_var("FORMSPREE_ID"),
            formspree_base_url: env::var("FORMSPREE_BASE_URL")
                .unwrap_or_else(|_| "https://formspree.io/f/".to_string()),
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Picks the completion API key: the environment wins, then whatever the
    /// user typed into the front end.
    pub fn resolve_api_key(&self, ui_value: Option<&str>) -> AppResult<SecretString> {
        if let Some(key) = &self.gemini_api_key {
            if !key.expose_secret().is_empty() {
                return Ok(key.clone());
            }
        }

        ui_value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.to_string()))
            .ok_or_else(|| AppError::MissingCredential("Gemini API Key".to_string()))
    }

    pub fn resolve_formspree_id(&self, ui_value: Option<&str>) -> AppResult<String> {
        self.formspree_id
            .clone()
            .or_else(|| {
                ui_value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| AppError::MissingCredential("Formspree form id".to_string()))
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "http://127.0.0.1:9/v1".to_string(),
            gemini_proxy_url: None,
            question_count: 5,
            language: "English".to_string(),
            max_output_tokens: 2048,
            store_path: "quizify-test.json".to_string(),
            content_fetch_base_url: "http://127.0.0.1:9/".to_string(),
            formspree_id: None,
            formspree_base_url: "http://127.0.0.1:9/f/".to_string(),
            http_timeout_seconds: 1,
        }
    }
}
