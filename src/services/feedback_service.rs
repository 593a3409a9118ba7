use async_trait::async_trait;
use std::time::Duration;
use validator::Validate;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::dto::request::FeedbackRequest,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRelay: Send + Sync {
    async fn send(&self, feedback: &FeedbackRequest) -> AppResult<()>;
}

/// Posts feedback to a Formspree form.
pub struct FormspreeRelay {
    http: reqwest::Client,
    endpoint: String,
}

impl FormspreeRelay {
    pub fn new(config: &Config, form_id: Option<&str>) -> AppResult<Self> {
        let form_id = config.resolve_formspree_id(form_id)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::RelayFailed(format!("HTTP client unavailable: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", config.formspree_base_url, form_id),
        })
    }
}

#[async_trait]
impl FeedbackRelay for FormspreeRelay {
    async fn send(&self, feedback: &FeedbackRequest) -> AppResult<()> {
        feedback.validate()?;

        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(feedback)
            .send()
            .await
            .map_err(|e| AppError::RelayFailed(format!("Could not send feedback: {}", e)))?;

        if !response.status().is_success() {
            log::warn!("Feedback relay answered {}", response.status());
            return Err(AppError::RelayFailed(format!(
                "Feedback was rejected ({})",
                response.status().as_u16()
            )));
        }

        log::info!("Feedback sent");
        Ok(())
    }
}
