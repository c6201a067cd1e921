use study_core::model::{FileUpload, QuizId};

use super::engine::{QuizEngine, QuizSource};
use crate::error::{QuizError, RemoteError};
use crate::remote::RemoteService;

/// Fetches question data and hands it to a `QuizEngine`.
#[derive(Clone)]
pub struct QuizLoader {
    remote: RemoteService,
    questions_per_section: u8,
}

impl QuizLoader {
    #[must_use]
    pub fn new(remote: RemoteService, questions_per_section: u8) -> Self {
        Self {
            remote,
            questions_per_section,
        }
    }

    #[must_use]
    pub fn questions_per_section(&self) -> u8 {
        self.questions_per_section
    }

    /// Generate a quiz from an uploaded document.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Validation` for an empty or oversized document
    /// (nothing is sent), otherwise the backend's error.
    pub async fn generate(&self, upload: &FileUpload) -> Result<QuizSource, QuizError> {
        upload.validate_document()?;
        let generated = self
            .remote
            .generate_quiz(upload, self.questions_per_section)
            .await?;
        if let Some(warning) = &generated.warning {
            tracing::warn!(%warning, "quiz generated with a warning");
        }
        Ok(QuizSource::Generated(generated))
    }

    /// Look up a stored quiz. A missing quiz is `Fetched(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Remote` for any failure other than not-found.
    pub async fn fetch(&self, id: QuizId) -> Result<QuizSource, QuizError> {
        match self.remote.quiz_by_id(id).await {
            Ok(record) => Ok(QuizSource::Fetched(Some(record))),
            Err(RemoteError::NotFound) => Ok(QuizSource::Fetched(None)),
            Err(err) => Err(err.into()),
        }
    }

    /// Generate a quiz and load it into `engine`.
    ///
    /// # Errors
    ///
    /// Returns the errors of `generate` and `QuizEngine::finish_loading`. On
    /// failure the engine keeps the attempt it had before the call.
    pub async fn load_generated(
        &self,
        engine: &QuizEngine,
        upload: &FileUpload,
    ) -> Result<(), QuizError> {
        upload.validate_document()?;
        let ticket = engine.begin_loading();
        match self.generate(upload).await {
            Ok(source) => engine.finish_loading(ticket, source),
            Err(err) => {
                engine.abort_loading(ticket, &err);
                Err(err)
            }
        }
    }

    /// Fetch a stored quiz and load it into `engine` for a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for an unknown id, otherwise the errors of
    /// `fetch` and `QuizEngine::finish_loading`.
    pub async fn load_by_id(&self, engine: &QuizEngine, id: QuizId) -> Result<(), QuizError> {
        let ticket = engine.begin_loading();
        match self.fetch(id).await {
            Ok(source) => engine.finish_loading(ticket, source),
            Err(err) => {
                engine.abort_loading(ticket, &err);
                Err(err)
            }
        }
    }
}
