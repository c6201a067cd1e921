use std::sync::{Mutex, MutexGuard, PoisonError};

use study_core::Clock;
use study_core::ValidationError;
use study_core::model::{
    AnswerKey, OptionKey, QuestionId, Quiz, QuizAttempt, QuizId, ScoreReport, SectionId,
};

use crate::error::QuizError;
use crate::remote::{GeneratedQuiz, QuizRecord, RemoteService, SubmitAck};

//
// ─── TYPES ─────────────────────────────────────────────────────────────────────
//

/// Where the engine is in one attempt's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Loading,
    Presenting,
    Completed,
    Submitting,
    Submitted,
}

/// Question data a quiz can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSource {
    Generated(GeneratedQuiz),
    /// Result of a lookup by id; `None` when the backend had no such quiz.
    Fetched(Option<QuizRecord>),
}

/// Caller-supplied submission details. Missing fields fall back to the loaded
/// quiz id and the time elapsed since the attempt started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptMetadata {
    pub quiz_id: Option<QuizId>,
    pub time_taken_seconds: Option<u64>,
}

/// Identifies one `begin_loading` call so a late load can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket {
    generation: u64,
}

/// Read-only copy of the engine state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub phase: QuizPhase,
    pub attempt: Option<QuizAttempt>,
    pub last_error: Option<QuizError>,
    pub warning: Option<String>,
    pub ack: Option<SubmitAck>,
}

#[derive(Debug)]
struct QuizState {
    phase: QuizPhase,
    attempt: Option<QuizAttempt>,
    /// Phase to fall back to if the load in progress fails.
    resume: QuizPhase,
    generation: u64,
    last_error: Option<QuizError>,
    warning: Option<String>,
    ack: Option<SubmitAck>,
}

impl QuizState {
    fn new() -> Self {
        Self {
            phase: QuizPhase::Idle,
            attempt: None,
            resume: QuizPhase::Idle,
            generation: 0,
            last_error: None,
            warning: None,
            ack: None,
        }
    }

    /// Drop the current attempt and start a new generation.
    fn clear(&mut self) {
        self.generation += 1;
        self.phase = QuizPhase::Idle;
        self.resume = QuizPhase::Idle;
        self.attempt = None;
        self.last_error = None;
        self.warning = None;
        self.ack = None;
    }

    /// Enter `Loading` for a new generation. The current attempt stays until
    /// the load succeeds; an outstanding submission is superseded.
    fn start_load(&mut self) {
        self.generation += 1;
        self.resume = match self.phase {
            QuizPhase::Loading => self.resume,
            QuizPhase::Submitting => QuizPhase::Completed,
            phase => phase,
        };
        self.phase = QuizPhase::Loading;
        self.last_error = None;
    }

    fn fail_load(&mut self, err: &QuizError) {
        self.phase = self.resume;
        self.last_error = Some(err.clone());
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Owns one quiz attempt at a time.
///
/// Only `submit` talks to the backend. Answers are write-once and the attempt
/// is submitted at most once; a load or discard while a submission is in
/// flight turns its response into `QuizError::Superseded`.
pub struct QuizEngine {
    clock: Clock,
    remote: RemoteService,
    state: Mutex<QuizState>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(clock: Clock, remote: RemoteService) -> Self {
        Self {
            clock,
            remote,
            state: Mutex::new(QuizState::new()),
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        let state = self.lock();
        QuizSnapshot {
            phase: state.phase,
            attempt: state.attempt.clone(),
            last_error: state.last_error.clone(),
            warning: state.warning.clone(),
            ack: state.ack.clone(),
        }
    }

    /// Show a loading state until the ticket is finished or aborted. The
    /// current attempt is only replaced once the load succeeds.
    pub fn begin_loading(&self) -> LoadTicket {
        let mut state = self.lock();
        state.start_load();
        LoadTicket {
            generation: state.generation,
        }
    }

    /// Complete a load started with `begin_loading`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Superseded` if another load or a discard happened
    /// since the ticket was issued, otherwise the errors of `load_quiz`.
    pub fn finish_loading(&self, ticket: LoadTicket, source: QuizSource) -> Result<(), QuizError> {
        let mut state = self.lock();
        if state.generation != ticket.generation {
            tracing::warn!("dropping quiz load for a replaced attempt");
            return Err(QuizError::Superseded);
        }
        self.apply_source(&mut state, source)
    }

    /// Record a failed load and return to the attempt that was current
    /// before it. Ignored if the ticket is stale.
    pub fn abort_loading(&self, ticket: LoadTicket, error: &QuizError) {
        let mut state = self.lock();
        if state.generation != ticket.generation {
            return;
        }
        state.fail_load(error);
    }

    /// Replace any current attempt with a fresh one built from `source`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for an empty lookup and
    /// `QuizError::Validation` if the question data is malformed. The previous
    /// attempt and its answers are kept in both cases.
    pub fn load_quiz(&self, source: QuizSource) -> Result<(), QuizError> {
        let mut state = self.lock();
        state.start_load();
        self.apply_source(&mut state, source)
    }

    fn apply_source(&self, state: &mut QuizState, source: QuizSource) -> Result<(), QuizError> {
        let (quiz, warning) = match quiz_from_source(source) {
            Ok(loaded) => loaded,
            Err(err) => {
                state.fail_load(&err);
                return Err(err);
            }
        };

        tracing::info!(
            quiz_id = ?quiz.id(),
            sections = quiz.sections().len(),
            total = quiz.total_questions(),
            "quiz loaded"
        );
        state.attempt = Some(QuizAttempt::new(quiz, self.clock.now()));
        state.phase = QuizPhase::Presenting;
        state.last_error = None;
        state.warning = warning;
        state.ack = None;
        Ok(())
    }

    /// Lock in an answer. Returns `false` if the question was already answered.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotLoaded` without an attempt, `QuizError::NotAnswerable`
    /// outside `Presenting`/`Completed`, and a validation error for a key that
    /// is not part of the quiz.
    pub fn select_answer(
        &self,
        section: SectionId,
        question: QuestionId,
        option: OptionKey,
    ) -> Result<bool, QuizError> {
        let mut state = self.lock();
        match state.phase {
            QuizPhase::Presenting | QuizPhase::Completed => {}
            QuizPhase::Idle | QuizPhase::Loading => return Err(QuizError::NotLoaded),
            QuizPhase::Submitting | QuizPhase::Submitted => return Err(QuizError::NotAnswerable),
        }
        let attempt = state.attempt.as_mut().ok_or(QuizError::NotLoaded)?;
        let recorded = attempt.select(AnswerKey::new(section, question), option)?;
        if recorded && attempt.completed() {
            tracing::debug!(score = attempt.score(), "all questions answered");
            state.phase = QuizPhase::Completed;
        }
        Ok(recorded)
    }

    /// Current score, or `None` without an attempt.
    #[must_use]
    pub fn score_report(&self) -> Option<ScoreReport> {
        self.lock().attempt.as_ref().map(QuizAttempt::score_report)
    }

    /// Submit the completed attempt once.
    ///
    /// # Errors
    ///
    /// - `QuizError::AlreadyInProgress` while a submission is outstanding; no
    ///   second request is sent.
    /// - `QuizError::AlreadySubmitted`, `NotCompleted` or `NotLoaded` for the
    ///   other phases.
    /// - `QuizError::Validation` if no quiz id can be resolved.
    /// - `QuizError::Remote` if the backend call failed; the attempt returns
    ///   to `Completed` and may be submitted again.
    /// - `QuizError::Superseded` if the attempt was replaced meanwhile.
    pub async fn submit(&self, metadata: AttemptMetadata) -> Result<SubmitAck, QuizError> {
        let (generation, submission) = {
            let mut state = self.lock();
            match state.phase {
                QuizPhase::Completed => {}
                QuizPhase::Submitting => return Err(QuizError::AlreadyInProgress),
                QuizPhase::Submitted => return Err(QuizError::AlreadySubmitted),
                QuizPhase::Presenting => return Err(QuizError::NotCompleted),
                QuizPhase::Idle | QuizPhase::Loading => return Err(QuizError::NotLoaded),
            }
            let attempt = state.attempt.as_ref().ok_or(QuizError::NotLoaded)?;
            let quiz_id = metadata
                .quiz_id
                .or_else(|| attempt.quiz().id())
                .ok_or(ValidationError::MissingQuizId)?;
            let seconds = metadata
                .time_taken_seconds
                .unwrap_or_else(|| self.clock.seconds_since(attempt.started_at()));
            let submission = attempt.submission(quiz_id, seconds);

            state.phase = QuizPhase::Submitting;
            state.last_error = None;
            (state.generation, submission)
        };

        let guard = SubmitGuard {
            engine: self,
            generation,
        };
        let result = self.remote.submit_quiz_attempt(&submission).await;
        std::mem::forget(guard);

        let mut state = self.lock();
        if state.generation != generation {
            tracing::warn!(quiz_id = %submission.quiz_id, "dropping submit response for a replaced attempt");
            return Err(QuizError::Superseded);
        }
        match result {
            Ok(ack) => {
                if let Some(attempt) = state.attempt.as_mut() {
                    attempt.mark_submitted();
                }
                state.phase = QuizPhase::Submitted;
                state.ack = Some(ack.clone());
                tracing::info!(
                    quiz_id = %submission.quiz_id,
                    score = submission.score,
                    total = submission.total_questions,
                    "attempt submitted"
                );
                Ok(ack)
            }
            Err(err) => {
                let err = QuizError::from(err);
                state.phase = QuizPhase::Completed;
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Forget the current attempt. Always legal.
    pub fn discard(&self) {
        let mut state = self.lock();
        state.clear();
        tracing::debug!("quiz attempt discarded");
    }

    fn lock(&self) -> MutexGuard<'_, QuizState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns an abandoned submission to `Completed` so it can be sent again.
struct SubmitGuard<'a> {
    engine: &'a QuizEngine,
    generation: u64,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.lock();
        if state.generation == self.generation && state.phase == QuizPhase::Submitting {
            tracing::debug!("submission abandoned before a response");
            state.phase = QuizPhase::Completed;
        }
    }
}

fn quiz_from_source(source: QuizSource) -> Result<(Quiz, Option<String>), QuizError> {
    match source {
        QuizSource::Generated(generated) => {
            let quiz = Quiz::from_drafts(generated.quiz_id, generated.title, generated.sections)?;
            Ok((quiz, generated.warning))
        }
        QuizSource::Fetched(Some(record)) => {
            let title = record.title.or(record.filename);
            let quiz = Quiz::from_drafts(Some(record.id), title, record.sections)?;
            Ok((quiz, None))
        }
        QuizSource::Fetched(None) => Err(QuizError::NotFound),
    }
}
