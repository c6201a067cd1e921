//! Backend boundary: the raw transport trait, its HTTP implementation, and the
//! authenticated facade the engines talk to.

mod config;
mod http;
mod normalize;
#[cfg(test)]
pub(crate) mod offline;
mod service;

use async_trait::async_trait;

use study_core::model::{
    AttemptId, AttemptSubmission, ConversationTurn, Credentials, DoubtHistoryPage, DoubtId,
    DoubtRecord, FileUpload, ImageAttachment, PageRequest, PdfAttachment, ProfileSummary,
    QuestionDraft, QuizHistoryPage, QuizId, RegistrationProfile,
};

use crate::auth::AuthToken;
use crate::error::RemoteError;

pub use config::RemoteConfig;
pub use http::HttpBackend;
pub use service::RemoteService;

/// Quiz content returned by generation, already normalized to ordered sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuiz {
    /// Absent when the backend generated the quiz but could not save it.
    pub quiz_id: Option<QuizId>,
    pub title: Option<String>,
    pub sections: Vec<Vec<QuestionDraft>>,
    pub warning: Option<String>,
}

/// A persisted quiz fetched by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRecord {
    pub id: QuizId,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub sections: Vec<Vec<QuestionDraft>>,
}

/// Everything the backend needs to answer one doubt turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveDoubtRequest {
    pub question: String,
    pub subjects: Vec<String>,
    pub conversation: Vec<ConversationTurn>,
    pub pdf: Option<PdfAttachment>,
    pub image: Option<ImageAttachment>,
}

/// Business outcome of a doubt request that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Answer(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub attempt_id: Option<AttemptId>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAck {
    pub user_id: u64,
    pub email: String,
}

/// Source document of a quiz as stored by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Raw backend transport. Authenticated calls receive the token explicitly.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, RemoteError>;

    async fn register(&self, profile: &RegistrationProfile) -> Result<RegisterAck, RemoteError>;

    async fn generate_quiz(
        &self,
        token: &AuthToken,
        file: &FileUpload,
        questions_per_section: u8,
    ) -> Result<GeneratedQuiz, RemoteError>;

    async fn solve_doubt(
        &self,
        token: &AuthToken,
        request: &SolveDoubtRequest,
    ) -> Result<SolveOutcome, RemoteError>;

    async fn submit_quiz_attempt(
        &self,
        token: &AuthToken,
        submission: &AttemptSubmission,
    ) -> Result<SubmitAck, RemoteError>;

    async fn get_profile(&self, token: &AuthToken) -> Result<ProfileSummary, RemoteError>;

    async fn get_quiz_history(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<QuizHistoryPage, RemoteError>;

    async fn get_doubt_history(
        &self,
        token: &AuthToken,
        page: PageRequest,
        subject: Option<&str>,
    ) -> Result<DoubtHistoryPage, RemoteError>;

    async fn get_quiz_by_id(&self, token: &AuthToken, id: QuizId)
    -> Result<QuizRecord, RemoteError>;

    async fn get_doubt_by_id(
        &self,
        token: &AuthToken,
        id: DoubtId,
    ) -> Result<DoubtRecord, RemoteError>;

    async fn download_file(
        &self,
        token: &AuthToken,
        id: QuizId,
    ) -> Result<DownloadedFile, RemoteError>;
}
