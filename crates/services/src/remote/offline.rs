use async_trait::async_trait;

use study_core::model::{
    AttemptSubmission, Credentials, DoubtHistoryPage, DoubtId, DoubtRecord, FileUpload,
    PageRequest, ProfileSummary, QuizHistoryPage, QuizId, RegistrationProfile,
};

use super::{
    BackendApi, DownloadedFile, GeneratedQuiz, QuizRecord, RegisterAck, SolveDoubtRequest,
    SolveOutcome, SubmitAck,
};
use crate::auth::AuthToken;
use crate::error::RemoteError;

/// Backend that fails every call as unreachable.
pub(crate) struct OfflineBackend;

fn offline<T>() -> Result<T, RemoteError> {
    Err(RemoteError::Network("offline".into()))
}

#[async_trait]
impl BackendApi for OfflineBackend {
    async fn login(&self, _: &Credentials) -> Result<AuthToken, RemoteError> {
        offline()
    }

    async fn register(&self, _: &RegistrationProfile) -> Result<RegisterAck, RemoteError> {
        offline()
    }

    async fn generate_quiz(
        &self,
        _: &AuthToken,
        _: &FileUpload,
        _: u8,
    ) -> Result<GeneratedQuiz, RemoteError> {
        offline()
    }

    async fn solve_doubt(
        &self,
        _: &AuthToken,
        _: &SolveDoubtRequest,
    ) -> Result<SolveOutcome, RemoteError> {
        offline()
    }

    async fn submit_quiz_attempt(
        &self,
        _: &AuthToken,
        _: &AttemptSubmission,
    ) -> Result<SubmitAck, RemoteError> {
        offline()
    }

    async fn get_profile(&self, _: &AuthToken) -> Result<ProfileSummary, RemoteError> {
        offline()
    }

    async fn get_quiz_history(
        &self,
        _: &AuthToken,
        _: PageRequest,
    ) -> Result<QuizHistoryPage, RemoteError> {
        offline()
    }

    async fn get_doubt_history(
        &self,
        _: &AuthToken,
        _: PageRequest,
        _: Option<&str>,
    ) -> Result<DoubtHistoryPage, RemoteError> {
        offline()
    }

    async fn get_quiz_by_id(&self, _: &AuthToken, _: QuizId) -> Result<QuizRecord, RemoteError> {
        offline()
    }

    async fn get_doubt_by_id(&self, _: &AuthToken, _: DoubtId) -> Result<DoubtRecord, RemoteError> {
        offline()
    }

    async fn download_file(&self, _: &AuthToken, _: QuizId) -> Result<DownloadedFile, RemoteError> {
        offline()
    }
}
