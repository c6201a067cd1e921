use study_core::model::{
    DoubtHistoryPage, DoubtId, DoubtRecord, PageRequest, ProfileSummary, QuizHistoryPage, QuizId,
};

use crate::error::AccountError;
use crate::remote::{DownloadedFile, RemoteService};

/// Read-only access to the signed-in user's profile and past activity.
#[derive(Clone)]
pub struct HistoryService {
    remote: RemoteService,
}

impl HistoryService {
    #[must_use]
    pub fn new(remote: RemoteService) -> Self {
        Self { remote }
    }

    /// # Errors
    ///
    /// Returns `AccountError::Remote` if the backend call fails.
    pub async fn profile(&self) -> Result<ProfileSummary, AccountError> {
        Ok(self.remote.profile().await?)
    }

    /// # Errors
    ///
    /// Returns `AccountError::Remote` if the backend call fails.
    pub async fn quiz_history(&self, page: PageRequest) -> Result<QuizHistoryPage, AccountError> {
        Ok(self.remote.quiz_history(page).await?)
    }

    /// Past doubts, optionally narrowed to one subject. A blank filter means
    /// no filter.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Remote` if the backend call fails.
    pub async fn doubt_history(
        &self,
        page: PageRequest,
        subject: Option<&str>,
    ) -> Result<DoubtHistoryPage, AccountError> {
        let subject = subject.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.remote.doubt_history(page, subject).await?)
    }

    /// # Errors
    ///
    /// Returns `AccountError::Remote` if the backend call fails.
    pub async fn doubt(&self, id: DoubtId) -> Result<DoubtRecord, AccountError> {
        Ok(self.remote.doubt_by_id(id).await?)
    }

    /// Source document a quiz was generated from.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Remote` if the backend call fails.
    pub async fn download_source(&self, quiz_id: QuizId) -> Result<DownloadedFile, AccountError> {
        Ok(self.remote.download_file(quiz_id).await?)
    }
}
