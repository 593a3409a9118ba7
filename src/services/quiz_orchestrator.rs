use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    constants::quiz_prompt::{build_quiz_prompt, recommendation_text},
    errors::{AppError, AppResult},
    models::{
        domain::{PlayerProfile, Quiz},
        dto::{
            completion_dto::{GenerateContentRequest, GenerationConfig},
            request::{GenerateQuizRequest, QuizSource},
        },
    },
    services::{
        content_service::ContentExtractor,
        model_service::CompletionService,
        profile_service::ProfileService,
        quiz_session::{QuizSession, SessionCommand, SessionEvent},
        response_sanitizer::extract_quiz,
    },
};

/// Identifies one generation request. Results carrying an older ticket are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    generation: u64,
    id: Uuid,
}

impl GenerationTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The quiz was accepted and a session started.
    Applied { title: String, question_count: usize },
    /// The user moved on before the result arrived.
    Stale,
}

/// The I/O half of generation: source to quiz. Cheap to clone so it can run
/// while the orchestrator stays free to take a reset.
#[derive(Clone)]
pub struct QuizGenerator {
    config: Arc<Config>,
    completion: Arc<dyn CompletionService>,
    extractor: Arc<dyn ContentExtractor>,
}

impl QuizGenerator {
    pub fn new(
        config: Arc<Config>,
        completion: Arc<dyn CompletionService>,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Self {
        Self {
            config,
            completion,
            extractor,
        }
    }

    pub async fn generate_quiz(&self, request: &GenerateQuizRequest) -> AppResult<Quiz> {
        request.validate()?;

        let api_key = if self.completion.requires_api_key() {
            Some(self.config.resolve_api_key(request.api_key.as_deref())?)
        } else {
            None
        };

        let content = self.extractor.extract(&request.source).await?;
        let prompt = build_quiz_prompt(
            request.question_count,
            &request.language,
            content.prompt_input(),
        );
        let payload = GenerateContentRequest::new(
            prompt,
            content.image(),
            GenerationConfig::quiz_defaults(self.config.max_output_tokens),
        );

        let raw = self.completion.generate(payload, api_key).await?;
        log::debug!("Raw completion: {}", raw);

        let quiz = extract_quiz(&raw).map_err(|e| {
            log::error!("Could not recover a quiz from the completion: {}", e);
            AppError::from(e)
        })?;
        Ok(quiz)
    }
}

/// Drives one user's flow: generation, the running session, and the profile
/// ledger that results feed into.
pub struct QuizOrchestrator {
    generator: QuizGenerator,
    profiles: ProfileService,
    session: QuizSession,
    generation: u64,
    in_flight: bool,
}

impl QuizOrchestrator {
    pub fn new(generator: QuizGenerator, profiles: ProfileService) -> Self {
        Self {
            generator,
            profiles,
            session: QuizSession::new(),
            generation: 0,
            in_flight: false,
        }
    }

    pub fn generator(&self) -> QuizGenerator {
        self.generator.clone()
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileService {
        &mut self.profiles
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight
    }

    pub fn begin_generation(&mut self) -> AppResult<GenerationTicket> {
        if self.in_flight {
            return Err(AppError::InvalidCommand(
                "a quiz is already being generated".to_string(),
            ));
        }

        self.in_flight = true;
        let ticket = GenerationTicket {
            generation: self.generation,
            id: Uuid::new_v4(),
        };
        log::info!("Starting quiz generation {}", ticket.id);
        Ok(ticket)
    }

    /// Accepts the result of the generation `ticket` was issued for.
    pub fn apply_generation(
        &mut self,
        ticket: GenerationTicket,
        result: AppResult<Quiz>,
    ) -> AppResult<GenerationOutcome> {
        if ticket.generation != self.generation {
            log::info!("Dropping result of abandoned generation {}", ticket.id);
            return Ok(GenerationOutcome::Stale);
        }
        self.in_flight = false;

        let quiz = result.map_err(|e| {
            log::warn!("Generation {} failed: {}", ticket.id, e);
            e
        })?;

        let title = quiz.title().to_string();
        let question_count = quiz.len();
        self.profiles.save_topic(&title)?;
        self.session.start(quiz);

        log::info!(
            "Generation {} produced '{}' with {} questions",
            ticket.id,
            title,
            question_count
        );
        Ok(GenerationOutcome::Applied {
            title,
            question_count,
        })
    }

    /// Runs a whole generation and starts the resulting session.
    pub async fn generate(&mut self, request: GenerateQuizRequest) -> AppResult<GenerationOutcome> {
        let ticket = self.begin_generation()?;
        let result = self.generator.generate_quiz(&request).await;
        self.apply_generation(ticket, result)
    }

    /// Back to source selection. Any pending generation becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = false;
        self.session.reset();
    }

    /// Forwards a command to the session. A finished quiz pays its XP into
    /// the active profile; if that cannot be persisted the XP stays in memory
    /// and goes out with the next successful save.
    pub fn dispatch(&mut self, command: SessionCommand) -> AppResult<SessionEvent> {
        let event = self.session.dispatch(command)?;
        if let SessionEvent::Completed(summary) = &event {
            match self.profiles.record_result(summary) {
                Ok(profile) => log::info!(
                    "Quiz finished with {}%, {} now has {} XP",
                    summary.percent,
                    profile.username,
                    profile.xp
                ),
                Err(err) => log::error!("Could not save quiz result: {}", err),
            }
        }
        Ok(event)
    }

    pub fn tick(&mut self) {
        self.session.tick();
    }

    pub fn check_streak(&mut self, today: NaiveDate) -> AppResult<u32> {
        self.profiles.check_streak(today)
    }

    pub fn active_profile(&self) -> AppResult<&PlayerProfile> {
        self.profiles.active()
    }
}

/// Source used when the user picks one of their saved topics.
pub fn recommendation_source(topic: &str) -> QuizSource {
    QuizSource::Text(recommendation_text(topic))
}
