use std::sync::{Mutex, MutexGuard, PoisonError};

use study_core::ValidationError;
use study_core::model::{
    Checkpoint, Conversation, ConversationTurn, FileUpload, ImageAttachment, PdfAttachment,
    SubjectSet,
};

use crate::error::DoubtError;
use crate::remote::{RemoteService, SolveDoubtRequest};

/// Derived view of where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubtPhase {
    Empty,
    AwaitingFirstAnswer,
    Active,
    /// The last request failed; confirmed turns are intact and the user may retry.
    Error,
}

/// Read-only copy of the session for rendering. Attachments are reported by
/// file name only.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubtSnapshot {
    pub phase: DoubtPhase,
    pub conversation: Vec<ConversationTurn>,
    pub subjects: Vec<String>,
    pub image_name: Option<String>,
    pub pdf_name: Option<String>,
    pub pending: bool,
    pub last_error: Option<DoubtError>,
}

#[derive(Debug, Default)]
struct DoubtState {
    conversation: Conversation,
    subjects: SubjectSet,
    image: Option<ImageAttachment>,
    pdf: Option<PdfAttachment>,
    pending: bool,
    generation: u64,
    last_error: Option<DoubtError>,
}

impl DoubtState {
    fn phase(&self) -> DoubtPhase {
        if self.pending && self.conversation.is_empty() {
            DoubtPhase::AwaitingFirstAnswer
        } else if self.last_error.is_some() {
            DoubtPhase::Error
        } else if self.conversation.is_empty() {
            DoubtPhase::Empty
        } else {
            DoubtPhase::Active
        }
    }

    fn ensure_idle(&self) -> Result<(), DoubtError> {
        if self.pending {
            Err(DoubtError::Busy)
        } else {
            Ok(())
        }
    }

    fn request(&self, question: &str) -> SolveDoubtRequest {
        SolveDoubtRequest {
            question: question.to_string(),
            subjects: self.subjects.as_slice().to_vec(),
            conversation: self.conversation.turns().to_vec(),
            pdf: self.pdf.clone(),
            image: self.image.clone(),
        }
    }
}

/// Owns one doubt-solving conversation.
///
/// The conversation only ever holds confirmed exchanges: the first question
/// and its answer are appended together, and a follow-up that fails is rolled
/// back. One request may be outstanding at a time; `reset` while a request is
/// in flight makes its response `DoubtError::Superseded`.
pub struct DoubtEngine {
    remote: RemoteService,
    state: Mutex<DoubtState>,
}

impl DoubtEngine {
    #[must_use]
    pub fn new(remote: RemoteService) -> Self {
        Self {
            remote,
            state: Mutex::new(DoubtState::default()),
        }
    }

    #[must_use]
    pub fn phase(&self) -> DoubtPhase {
        self.lock().phase()
    }

    #[must_use]
    pub fn snapshot(&self) -> DoubtSnapshot {
        let state = self.lock();
        DoubtSnapshot {
            phase: state.phase(),
            conversation: state.conversation.turns().to_vec(),
            subjects: state.subjects.as_slice().to_vec(),
            image_name: state.image.as_ref().map(|i| i.file().file_name.clone()),
            pdf_name: state.pdf.as_ref().map(|p| p.file().file_name.clone()),
            pending: state.pending,
            last_error: state.last_error.clone(),
        }
    }

    //
    // ─── REQUESTS ──────────────────────────────────────────────────────────────
    //

    /// Ask the opening question with the currently selected subjects and
    /// attachments. Returns the assistant's answer.
    ///
    /// # Errors
    ///
    /// - `ValidationError::BlankQuestion` for blank input; nothing is sent.
    /// - `DoubtError::Busy` / `AlreadyStarted` if a request is outstanding or
    ///   the conversation already has turns.
    /// - `DoubtError::Remote` if the call failed; the conversation stays empty.
    /// - `DoubtError::Superseded` if `reset` was called meanwhile.
    pub async fn ask_first(&self, question: &str) -> Result<String, DoubtError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::BlankQuestion.into());
        }

        let (generation, request) = {
            let mut state = self.lock();
            state.ensure_idle()?;
            if !state.conversation.is_empty() {
                return Err(DoubtError::AlreadyStarted);
            }
            state.pending = true;
            state.last_error = None;
            (state.generation, state.request(question))
        };

        let guard = PendingGuard {
            engine: self,
            generation,
            checkpoint: None,
        };
        let result = self.remote.solve_doubt(&request).await;
        std::mem::forget(guard);

        let mut state = self.lock();
        if state.generation != generation {
            tracing::warn!("dropping doubt answer for a reset conversation");
            return Err(DoubtError::Superseded);
        }
        state.pending = false;
        match result {
            Ok(answer) => {
                if !state.conversation.open(question, answer.as_str()) {
                    return Err(DoubtError::AlreadyStarted);
                }
                tracing::info!(subjects = request.subjects.len(), "doubt answered");
                Ok(answer)
            }
            Err(err) => Err(record_failure(&mut state, err.into())),
        }
    }

    /// Send a follow-up with the full conversation as context. The request
    /// repeats the opening question; the follow-up is the last conversation
    /// turn. Returns the assistant's reply.
    ///
    /// # Errors
    ///
    /// - `ValidationError::BlankFollowUp` for blank input; nothing is sent.
    /// - `DoubtError::NotStarted` / `Busy` for an empty conversation or an
    ///   outstanding request.
    /// - `DoubtError::Remote` if the call failed; the follow-up turn is
    ///   removed again so the conversation equals its value before the call.
    /// - `DoubtError::Superseded` if `reset` was called meanwhile.
    pub async fn clarify(&self, follow_up: &str) -> Result<String, DoubtError> {
        let follow_up = follow_up.trim();
        if follow_up.is_empty() {
            return Err(ValidationError::BlankFollowUp.into());
        }

        let (generation, checkpoint, request) = {
            let mut state = self.lock();
            state.ensure_idle()?;
            if state.conversation.is_empty() {
                return Err(DoubtError::NotStarted);
            }
            let question = state
                .conversation
                .opening_question()
                .unwrap_or(follow_up)
                .to_string();
            let checkpoint = state.conversation.push_user(follow_up);
            state.pending = true;
            state.last_error = None;
            (state.generation, checkpoint, state.request(&question))
        };

        let guard = PendingGuard {
            engine: self,
            generation,
            checkpoint: Some(checkpoint),
        };
        let result = self.remote.solve_doubt(&request).await;
        std::mem::forget(guard);

        let mut state = self.lock();
        if state.generation != generation {
            tracing::warn!("dropping follow-up answer for a reset conversation");
            return Err(DoubtError::Superseded);
        }
        state.pending = false;
        match result {
            Ok(answer) => {
                state.conversation.push_assistant(answer.as_str())?;
                tracing::debug!(turns = state.conversation.len(), "follow-up answered");
                Ok(answer)
            }
            Err(err) => {
                state.conversation.restore(checkpoint);
                Err(record_failure(&mut state, err.into()))
            }
        }
    }

    //
    // ─── CONTEXT ───────────────────────────────────────────────────────────────
    //

    /// Hold `file` as the image attachment, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding, or a
    /// validation error for a non-image or an image over 5 MiB. The previous
    /// attachment is kept on error.
    pub fn attach_image(&self, file: FileUpload) -> Result<(), DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        let image = ImageAttachment::new(file)?;
        tracing::debug!(file = %image.file().file_name, size = image.file().size(), "image attached");
        state.image = Some(image);
        Ok(())
    }

    /// Hold `file` as the PDF attachment, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding, or a
    /// validation error for a non-PDF or an oversized document. The previous
    /// attachment is kept on error.
    pub fn attach_pdf(&self, file: FileUpload) -> Result<(), DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        let pdf = PdfAttachment::new(file)?;
        tracing::debug!(file = %pdf.file().file_name, size = pdf.file().size(), "pdf attached");
        state.pdf = Some(pdf);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding.
    pub fn clear_image(&self) -> Result<(), DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        state.image = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding.
    pub fn clear_pdf(&self) -> Result<(), DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        state.pdf = None;
        Ok(())
    }

    /// Add the subject if absent, remove it if present. Returns whether it is
    /// now selected.
    ///
    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding, or
    /// `ValidationError::BlankSubject`.
    pub fn toggle_subject(&self, tag: &str) -> Result<bool, DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        Ok(state.subjects.toggle(tag)?)
    }

    /// Add a custom subject. Returns `false` if it was already selected.
    ///
    /// # Errors
    ///
    /// Returns `DoubtError::Busy` while a request is outstanding, or
    /// `ValidationError::BlankSubject`.
    pub fn add_custom_subject(&self, tag: &str) -> Result<bool, DoubtError> {
        let mut state = self.lock();
        state.ensure_idle()?;
        Ok(state.subjects.insert(tag)?)
    }

    /// Start a new chat. Always legal; an outstanding response is discarded
    /// when it arrives.
    pub fn reset(&self) {
        let mut state = self.lock();
        let generation = state.generation + 1;
        *state = DoubtState {
            generation,
            ..DoubtState::default()
        };
        tracing::info!("doubt session reset");
    }

    fn lock(&self) -> MutexGuard<'_, DoubtState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `pending` for a request whose future was dropped, rolling back an
/// unanswered follow-up.
struct PendingGuard<'a> {
    engine: &'a DoubtEngine,
    generation: u64,
    checkpoint: Option<Checkpoint>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.lock();
        if state.generation != self.generation || !state.pending {
            return;
        }
        tracing::debug!("doubt request abandoned before a response");
        state.pending = false;
        if let Some(checkpoint) = self.checkpoint {
            state.conversation.restore(checkpoint);
        }
    }
}

fn record_failure(state: &mut DoubtState, err: DoubtError) -> DoubtError {
    tracing::debug!(error = %err, "doubt request failed");
    state.last_error = Some(err.clone());
    err
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use study_core::model::{MAX_IMAGE_BYTES, PDF_MIME};

    use super::*;
    use crate::auth::{AuthSession, AuthToken};
    use crate::error::RemoteError;
    use crate::remote::offline::OfflineBackend;

    fn engine() -> DoubtEngine {
        let session = AuthSession::with_token(AuthToken::new("t"));
        DoubtEngine::new(RemoteService::new(Arc::new(OfflineBackend), session))
    }

    #[test]
    fn oversized_image_keeps_the_previous_one() {
        let engine = engine();
        engine
            .attach_image(FileUpload::new("small.png", "image/png", vec![1; 16]))
            .unwrap();

        let big = FileUpload::new("big.png", "image/png", vec![0; 6 * 1024 * 1024]);
        assert!(big.size() > MAX_IMAGE_BYTES);
        assert!(matches!(
            engine.attach_image(big),
            Err(DoubtError::Validation(ValidationError::FileTooLarge { .. }))
        ));
        assert_eq!(engine.snapshot().image_name.as_deref(), Some("small.png"));
    }

    #[test]
    fn attachments_are_replaced_and_cleared_independently() {
        let engine = engine();
        engine
            .attach_pdf(FileUpload::new("a.pdf", PDF_MIME, vec![1]))
            .unwrap();
        engine
            .attach_pdf(FileUpload::new("b.pdf", PDF_MIME, vec![2]))
            .unwrap();
        engine
            .attach_image(FileUpload::new("c.jpg", "image/jpeg", vec![3]))
            .unwrap();
        engine.clear_image().unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.pdf_name.as_deref(), Some("b.pdf"));
        assert_eq!(snapshot.image_name, None);
    }

    #[test]
    fn wrong_media_type_is_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.attach_pdf(FileUpload::new("x.png", "image/png", vec![1])),
            Err(DoubtError::Validation(ValidationError::WrongMediaType { .. }))
        ));
    }

    #[test]
    fn subjects_toggle_and_dedupe() {
        let engine = engine();
        assert!(engine.toggle_subject("Physics").unwrap());
        assert!(!engine.add_custom_subject(" Physics ").unwrap());
        assert!(engine.add_custom_subject("physics").unwrap());
        assert!(!engine.toggle_subject("Physics").unwrap());
        assert_eq!(engine.snapshot().subjects, vec!["physics".to_string()]);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_locally() {
        let engine = engine();
        assert_eq!(
            engine.ask_first("   ").await,
            Err(DoubtError::Validation(ValidationError::BlankQuestion))
        );
        assert_eq!(engine.clarify("why?").await, Err(DoubtError::NotStarted));
        assert_eq!(engine.phase(), DoubtPhase::Empty);
    }

    #[tokio::test]
    async fn failed_first_question_leaves_conversation_empty() {
        let engine = engine();
        let err = engine.ask_first("What is X?").await.unwrap_err();
        assert_eq!(
            err,
            DoubtError::Remote(RemoteError::Network("offline".into()))
        );

        let snapshot = engine.snapshot();
        assert!(snapshot.conversation.is_empty());
        assert!(!snapshot.pending);
        assert_eq!(snapshot.phase, DoubtPhase::Error);
    }

    #[test]
    fn reset_clears_everything() {
        let engine = engine();
        engine.toggle_subject("Biology").unwrap();
        engine
            .attach_image(FileUpload::new("c.jpg", "image/jpeg", vec![3]))
            .unwrap();
        engine.reset();
        let snapshot = engine.snapshot();
        assert!(snapshot.subjects.is_empty());
        assert_eq!(snapshot.image_name, None);
        assert_eq!(snapshot.phase, DoubtPhase::Empty);
    }
}
