pub mod content_service;
pub mod feedback_service;
pub mod model_service;
pub mod profile_service;
pub mod quiz_orchestrator;
pub mod quiz_session;
pub mod response_sanitizer;
