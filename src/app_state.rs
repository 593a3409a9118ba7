use chrono::Local;
use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::{FileStore, ProfileRepository},
    services::{
        content_service::DefaultContentExtractor,
        feedback_service::FormspreeRelay,
        model_service::GeminiClient,
        profile_service::ProfileService,
        quiz_orchestrator::{QuizGenerator, QuizOrchestrator},
    },
};

pub struct AppState {
    pub orchestrator: QuizOrchestrator,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let config = Arc::new(config);

        let store = Arc::new(FileStore::new(&config.store_path));
        let profile_repository = ProfileRepository::new(store);
        let mut profiles = ProfileService::load(profile_repository)?;
        profiles.check_streak(Local::now().date_naive())?;

        let completion = Arc::new(GeminiClient::new(&config)?);
        let extractor = Arc::new(DefaultContentExtractor::new(&config)?);
        let generator = QuizGenerator::new(config.clone(), completion, extractor);

        Ok(Self {
            orchestrator: QuizOrchestrator::new(generator, profiles),
            config,
        })
    }

    pub fn feedback_relay(&self, form_id: Option<&str>) -> AppResult<FormspreeRelay> {
        FormspreeRelay::new(&self.config, form_id)
    }
}
