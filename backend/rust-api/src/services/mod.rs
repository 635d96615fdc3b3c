use std::sync::Arc;

use crate::config::Config;
use question_store::{QuestionBank, QuestionStore};
use session_service::SessionStore;

pub struct AppState {
    pub config: Config,
    pub questions: Arc<QuestionStore>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Builds the state and tries an eager load of the question source.
    ///
    /// A missing source is not fatal here: every render reports it until the
    /// file shows up.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let questions = Arc::new(QuestionStore::new(config.questions.clone()));

        match questions.bank().await {
            Ok(bank) => tracing::info!("Question bank ready with {} questions", bank.len()),
            Err(e) => tracing::warn!("Question bank not loaded at startup: {}", e),
        }

        Ok(Self {
            sessions: Arc::new(session_store(&config)),
            config,
            questions,
        })
    }

    /// State over an already loaded bank.
    pub fn with_bank(config: Config, bank: QuestionBank) -> Self {
        let questions = Arc::new(QuestionStore::preloaded(config.questions.clone(), bank));
        Self {
            sessions: Arc::new(session_store(&config)),
            config,
            questions,
        }
    }
}

fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(config.session_ttl_secs, config.max_sessions)
}

pub mod auth_service;
pub mod filter_service;
pub mod grading_service;
pub mod question_store;
pub mod quiz_service;
pub mod sampler;
pub mod session_service;
