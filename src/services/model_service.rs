use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::{
    config::Config,
    errors::{AppError, AppResult, GenerationFailure},
    models::dto::completion_dto::{
        error_message, GenerateContentRequest, GenerateContentResponse, ProxyRequest,
    },
};

/// Anything that can turn a prompt payload into model text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Whether callers must supply an API key. A relay keeps its own.
    fn requires_api_key(&self) -> bool;

    async fn generate(
        &self,
        request: GenerateContentRequest,
        api_key: Option<SecretString>,
    ) -> Result<String, GenerationFailure>;
}

#[derive(Debug, Clone)]
enum Endpoint {
    Direct { base_url: String, model: String },
    Proxy { url: String },
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl GeminiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::GenerationFailed(GenerationFailure::Network(e.to_string())))?;

        let endpoint = match &config.gemini_proxy_url {
            Some(url) => Endpoint::Proxy { url: url.clone() },
            None => Endpoint::Direct {
                base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
                model: config.gemini_model.clone(),
            },
        };

        Ok(Self { http, endpoint })
    }

    async fn send(
        &self,
        request: &GenerateContentRequest,
        api_key: Option<SecretString>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        match &self.endpoint {
            Endpoint::Direct { base_url, model } => {
                let url = format!("{}/models/{}:generateContent", base_url, model);
                let mut builder = self.http.post(url).json(request);
                if let Some(key) = api_key {
                    builder = builder.header("x-goog-api-key", key.expose_secret());
                }
                builder.send().await
            }
            Endpoint::Proxy { url } => {
                self.http
                    .post(url)
                    .json(&ProxyRequest { payload: request })
                    .send()
                    .await
            }
        }
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    fn requires_api_key(&self) -> bool {
        matches!(self.endpoint, Endpoint::Direct { .. })
    }

    async fn generate(
        &self,
        request: GenerateContentRequest,
        api_key: Option<SecretString>,
    ) -> Result<String, GenerationFailure> {
        let response = self.send(&request, api_key).await.map_err(|e| {
            log::error!("Completion request failed: {}", e);
            GenerationFailure::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationFailure::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or_else(|| format!("HTTP Error {}", status.as_u16()));
            log::warn!("Completion API returned {}: {}", status, message);
            return Err(GenerationFailure::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationFailure::InvalidResponse(e.to_string()))?;

        match parsed.first_text() {
            Some(text) => {
                log::debug!("Completion returned {} characters", text.len());
                Ok(text.to_string())
            }
            None => Err(GenerationFailure::SafetyFiltered),
        }
    }
}
