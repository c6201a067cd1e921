use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ids::QuizId;
use crate::model::quiz::{AnswerKey, AnswerRecord, OptionKey, Quiz};

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Score over total, with the percentage only defined for non-empty quizzes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreReport {
    pub score: usize,
    pub total: usize,
    pub percentage: Option<f64>,
}

impl ScoreReport {
    #[must_use]
    pub fn compute(score: usize, total: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let percentage = (total > 0).then(|| score as f64 / total as f64 * 100.0);
        Self {
            score,
            total,
            percentage,
        }
    }

    /// Percentage with one decimal, e.g. `75.0%`.
    #[must_use]
    pub fn percentage_label(&self) -> Option<String> {
        self.percentage.map(|p| format!("{p:.1}%"))
    }
}

//
// ─── SUBMISSION PAYLOAD ────────────────────────────────────────────────────────
//

/// Body of a quiz attempt submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSubmission {
    pub quiz_id: QuizId,
    pub answers: AnswerRecord,
    pub score: usize,
    pub total_questions: usize,
    #[serde(rename = "time_taken")]
    pub time_taken_seconds: u64,
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One pass through a quiz: recorded answers, running score and completion.
///
/// `score` and `completed` are recomputed on every recorded answer, so they
/// always agree with `answers`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    quiz: Quiz,
    answers: AnswerRecord,
    score: usize,
    total_questions: usize,
    completed: bool,
    submitted: bool,
    started_at: DateTime<Utc>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(quiz: Quiz, started_at: DateTime<Utc>) -> Self {
        let total_questions = quiz.total_questions();
        Self {
            quiz,
            answers: AnswerRecord::new(),
            score: 0,
            total_questions,
            completed: false,
            submitted: false,
            started_at,
        }
    }

    /// Lock in `option` for the question at `key`.
    ///
    /// Returns `Ok(false)` when the question already has an answer; the
    /// attempt is left untouched in that case.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownQuestion` if `key` is not part of the quiz.
    pub fn select(&mut self, key: AnswerKey, option: OptionKey) -> Result<bool, ValidationError> {
        if self.quiz.question(key).is_none() {
            return Err(ValidationError::UnknownQuestion(key));
        }
        if !self.answers.record(key, option) {
            return Ok(false);
        }
        self.score = self.count_correct();
        self.completed = self.total_questions > 0 && self.answers.len() == self.total_questions;
        Ok(true)
    }

    fn count_correct(&self) -> usize {
        self.answers
            .iter()
            .filter(|(key, option)| {
                self.quiz
                    .question(*key)
                    .is_some_and(|question| question.is_correct(*option))
            })
            .count()
    }

    /// Flags the attempt as submitted. Returns `false` if it already was.
    pub fn mark_submitted(&mut self) -> bool {
        if self.submitted {
            return false;
        }
        self.submitted = true;
        true
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn score_report(&self) -> ScoreReport {
        ScoreReport::compute(self.score, self.total_questions)
    }

    /// Build the submission payload for this attempt.
    #[must_use]
    pub fn submission(&self, quiz_id: QuizId, time_taken_seconds: u64) -> AttemptSubmission {
        AttemptSubmission {
            quiz_id,
            answers: self.answers.clone(),
            score: self.score,
            total_questions: self.total_questions,
            time_taken_seconds,
        }
    }
}
