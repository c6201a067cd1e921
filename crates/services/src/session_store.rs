use std::sync::Arc;

use study_core::Clock;
use study_core::model::{Credentials, RegistrationProfile};

use crate::auth::{AuthGate, AuthSession};
use crate::doubt::DoubtEngine;
use crate::error::{ConfigError, RemoteError};
use crate::history_service::HistoryService;
use crate::quiz::{QuizEngine, QuizLoader};
use crate::remote::{BackendApi, HttpBackend, RegisterAck, RemoteConfig, RemoteService};

/// Assembles the session, the engines and the services that share it.
///
/// Holds no rules of its own; presentation reads engine state through the
/// accessors and calls engine operations directly.
#[derive(Clone)]
pub struct SessionStore {
    session: AuthSession,
    gate: AuthGate,
    remote: RemoteService,
    quiz: Arc<QuizEngine>,
    doubt: Arc<DoubtEngine>,
    history: Arc<HistoryService>,
    loader: QuizLoader,
}

impl SessionStore {
    /// Build a store talking HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn from_config(config: &RemoteConfig, clock: Clock) -> Result<Self, ConfigError> {
        let backend = HttpBackend::new(config)?;
        Ok(Self::with_backend(
            Arc::new(backend),
            clock,
            config.questions_per_section,
        ))
    }

    /// Build a store over any backend implementation.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn BackendApi>,
        clock: Clock,
        questions_per_section: u8,
    ) -> Self {
        let session = AuthSession::new();
        let remote = RemoteService::new(backend, session.clone());
        Self {
            gate: AuthGate::new(session.clone()),
            quiz: Arc::new(QuizEngine::new(clock, remote.clone())),
            doubt: Arc::new(DoubtEngine::new(remote.clone())),
            history: Arc::new(HistoryService::new(remote.clone())),
            loader: QuizLoader::new(remote.clone(), questions_per_section),
            session,
            remote,
        }
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    #[must_use]
    pub fn remote(&self) -> &RemoteService {
        &self.remote
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn doubt(&self) -> Arc<DoubtEngine> {
        Arc::clone(&self.doubt)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn loader(&self) -> &QuizLoader {
        &self.loader
    }

    /// # Errors
    ///
    /// Returns the backend's `RemoteError`.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        self.remote.login(credentials).await
    }

    /// # Errors
    ///
    /// Returns the backend's `RemoteError`.
    pub async fn register(&self, profile: &RegistrationProfile) -> Result<RegisterAck, RemoteError> {
        self.remote.register(profile).await
    }

    /// Sign out and drop all per-user engine state.
    pub fn logout(&self) {
        self.quiz.discard();
        self.doubt.reset();
        self.remote.logout();
    }

    /// Start a new doubt conversation.
    pub fn new_chat(&self) {
        self.doubt.reset();
    }
}
