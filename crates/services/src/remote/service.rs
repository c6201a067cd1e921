use std::future::Future;
use std::sync::Arc;

use study_core::model::{
    AttemptSubmission, Credentials, DoubtHistoryPage, DoubtId, DoubtRecord, FileUpload,
    PageRequest, ProfileSummary, QuizHistoryPage, QuizId, RegistrationProfile,
};

use super::{
    BackendApi, DownloadedFile, GeneratedQuiz, QuizRecord, RegisterAck, SolveDoubtRequest,
    SolveOutcome, SubmitAck,
};
use crate::auth::{AuthSession, AuthToken};
use crate::error::RemoteError;

/// Authenticated facade over a `BackendApi`.
///
/// Every protected call reads the token from the shared `AuthSession`. A call
/// without a token fails with `Unauthorized` before anything is sent, and an
/// `Unauthorized` response clears the session so every gate watcher sees it.
#[derive(Clone)]
pub struct RemoteService {
    backend: Arc<dyn BackendApi>,
    session: AuthSession,
}

impl RemoteService {
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>, session: AuthSession) -> Self {
        Self { backend, session }
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    //
    // ─── ACCOUNT ───────────────────────────────────────────────────────────────
    //

    /// Exchange credentials for a token and store it in the session.
    ///
    /// # Errors
    ///
    /// Returns the backend's `RemoteError`; the session is left untouched on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        let token = self.backend.login(credentials).await?;
        self.session.sign_in(token);
        Ok(())
    }

    pub fn logout(&self) {
        self.session.sign_out();
    }

    /// # Errors
    ///
    /// Returns the backend's `RemoteError`.
    pub async fn register(&self, profile: &RegistrationProfile) -> Result<RegisterAck, RemoteError> {
        self.backend.register(profile).await
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn profile(&self) -> Result<ProfileSummary, RemoteError> {
        self.authorized("profile", |backend, token| async move {
            backend.get_profile(&token).await
        })
        .await
    }

    //
    // ─── QUIZZES ───────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn generate_quiz(
        &self,
        file: &FileUpload,
        questions_per_section: u8,
    ) -> Result<GeneratedQuiz, RemoteError> {
        self.authorized("generate_quiz", |backend, token| async move {
            backend
                .generate_quiz(&token, file, questions_per_section)
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn submit_quiz_attempt(
        &self,
        submission: &AttemptSubmission,
    ) -> Result<SubmitAck, RemoteError> {
        self.authorized("submit_quiz_attempt", |backend, token| async move {
            backend.submit_quiz_attempt(&token, submission).await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn quiz_by_id(&self, id: QuizId) -> Result<QuizRecord, RemoteError> {
        self.authorized("quiz_by_id", |backend, token| async move {
            backend.get_quiz_by_id(&token, id).await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn download_file(&self, id: QuizId) -> Result<DownloadedFile, RemoteError> {
        self.authorized("download_file", |backend, token| async move {
            backend.download_file(&token, id).await
        })
        .await
    }

    //
    // ─── DOUBTS ────────────────────────────────────────────────────────────────
    //

    /// Ask the backend for one assistant turn.
    ///
    /// # Errors
    ///
    /// A backend-reported failure becomes `RemoteError::ServerLogic`; transport
    /// and auth failures are returned as-is.
    pub async fn solve_doubt(&self, request: &SolveDoubtRequest) -> Result<String, RemoteError> {
        let outcome = self
            .authorized("solve_doubt", |backend, token| async move {
                backend.solve_doubt(&token, request).await
            })
            .await?;
        match outcome {
            SolveOutcome::Answer(answer) => Ok(answer),
            SolveOutcome::Error(message) => Err(RemoteError::ServerLogic(message)),
        }
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn doubt_by_id(&self, id: DoubtId) -> Result<DoubtRecord, RemoteError> {
        self.authorized("doubt_by_id", |backend, token| async move {
            backend.get_doubt_by_id(&token, id).await
        })
        .await
    }

    //
    // ─── HISTORY ───────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn quiz_history(&self, page: PageRequest) -> Result<QuizHistoryPage, RemoteError> {
        self.authorized("quiz_history", |backend, token| async move {
            backend.get_quiz_history(&token, page).await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` without a session, otherwise the backend's error.
    pub async fn doubt_history(
        &self,
        page: PageRequest,
        subject: Option<&str>,
    ) -> Result<DoubtHistoryPage, RemoteError> {
        self.authorized("doubt_history", |backend, token| async move {
            backend.get_doubt_history(&token, page, subject).await
        })
        .await
    }

    async fn authorized<'a, T, F, Fut>(&'a self, op: &'static str, call: F) -> Result<T, RemoteError>
    where
        F: FnOnce(&'a dyn BackendApi, AuthToken) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>> + 'a,
    {
        let Some(token) = self.session.token() else {
            tracing::debug!(op, "no session; request not sent");
            return Err(RemoteError::Unauthorized);
        };
        tracing::debug!(op, "dispatching backend request");
        let result = call(self.backend.as_ref(), token).await;
        match &result {
            Err(RemoteError::Unauthorized) => {
                tracing::warn!(op, "backend rejected the session token");
                self.session.invalidate();
            }
            Err(err) => tracing::debug!(op, error = %err, "backend request failed"),
            Ok(_) => {}
        }
        result
    }
}
