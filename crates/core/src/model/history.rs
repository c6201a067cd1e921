//! Records exchanged with the backend for login, profile and history views.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::model::conversation::ConversationTurn;
use crate::model::ids::{AttemptId, DoubtId, QuizId};

/// Login form contents.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns `ValidationError::BlankField` if either field is blank.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() {
            return Err(ValidationError::BlankField("username"));
        }
        if password.is_empty() {
            return Err(ValidationError::BlankField("password"));
        }
        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Registration form contents.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationProfile {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationProfile {
    /// # Errors
    ///
    /// Returns `ValidationError::BlankField` if any field is blank.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.into().trim().to_string();
        let email = email.into().trim().to_string();
        let password = password.into();
        if username.is_empty() {
            return Err(ValidationError::BlankField("username"));
        }
        if email.is_empty() {
            return Err(ValidationError::BlankField("email"));
        }
        if password.is_empty() {
            return Err(ValidationError::BlankField("password"));
        }
        Ok(Self {
            username,
            email,
            password,
        })
    }
}

impl std::fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub total_doubts: u64,
    #[serde(default)]
    pub total_quizzes: u64,
    #[serde(default)]
    pub total_quiz_attempts: u64,
}

/// Offset pagination for history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    skip: u32,
    limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyPage` if `limit` is zero.
    pub fn new(skip: u32, limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::EmptyPage);
        }
        Ok(Self { skip, limit })
    }

    #[must_use]
    pub fn skip(&self) -> u32 {
        self.skip
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The page after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttemptSummary {
    pub id: AttemptId,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub time_taken: u64,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizHistoryItem {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub total_attempts: u32,
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub attempts: Vec<AttemptSummary>,
}

impl QuizHistoryItem {
    /// Most recent attempt; the backend lists attempts newest first.
    #[must_use]
    pub fn latest_attempt(&self) -> Option<&AttemptSummary> {
        self.attempts.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizHistoryPage {
    pub total: u64,
    #[serde(default)]
    pub quizzes: Vec<QuizHistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DoubtRecord {
    pub id: DoubtId,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "de_subjects")]
    pub subjects: Vec<String>,
    #[serde(default, deserialize_with = "de_turns")]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub context_filename: Option<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DoubtHistoryPage {
    pub total: u64,
    #[serde(default)]
    pub doubts: Vec<DoubtRecord>,
}

/// Accepts RFC 3339 timestamps and naive ones (read as UTC).
fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

fn de_subjects<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn de_turns<'de, D>(deserializer: D) -> Result<Vec<ConversationTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ConversationTurn>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conversation::Role;

    #[test]
    fn page_request_rejects_zero_limit() {
        assert_eq!(PageRequest::new(0, 0), Err(ValidationError::EmptyPage));
        let page = PageRequest::new(0, 10).unwrap().next();
        assert_eq!((page.skip(), page.limit()), (10, 10));
    }

    #[test]
    fn credentials_require_both_fields() {
        assert_eq!(
            Credentials::new("  ", "pw"),
            Err(ValidationError::BlankField("username"))
        );
        assert_eq!(
            Credentials::new("amy", ""),
            Err(ValidationError::BlankField("password"))
        );
        let creds = Credentials::new(" amy ", "pw").unwrap();
        assert_eq!(creds.username, "amy");
        assert!(!format!("{creds:?}").contains("pw"));
    }

    #[test]
    fn doubt_record_parses_backend_shape() {
        let record: DoubtRecord = serde_json::from_value(serde_json::json!({
            "id": 4,
            "question": "What is X?",
            "answer": "Y",
            "subjects": "Physics, Math",
            "conversation_history": [
                {"role": "user", "content": "What is X?"},
                {"role": "assistant", "content": "Y"}
            ],
            "context_filename": null,
            "created_at": "2024-05-01T10:30:00.123456"
        }))
        .unwrap();

        assert_eq!(record.id, DoubtId::new(4));
        assert_eq!(record.subjects, vec!["Physics", "Math"]);
        assert_eq!(record.conversation_history[1].role, Role::Assistant);
        assert!(record.created_at.is_some());
    }

    #[test]
    fn doubt_record_tolerates_null_history() {
        let record: DoubtRecord = serde_json::from_value(serde_json::json!({
            "id": 5,
            "question": "q",
            "subjects": null,
            "conversation_history": null,
            "created_at": "2024-05-01T10:30:00+00:00"
        }))
        .unwrap();
        assert!(record.subjects.is_empty());
        assert!(record.conversation_history.is_empty());
    }

    #[test]
    fn quiz_history_latest_attempt_is_first() {
        let page: QuizHistoryPage = serde_json::from_value(serde_json::json!({
            "total": 1,
            "quizzes": [{
                "id": 1,
                "title": "notes",
                "total_questions": 4,
                "attempts": [
                    {"id": 8, "score": 3, "total_questions": 4, "time_taken": 60, "completed_at": null},
                    {"id": 7, "score": 1, "total_questions": 4}
                ]
            }]
        }))
        .unwrap();
        let latest = page.quizzes[0].latest_attempt().unwrap();
        assert_eq!(latest.id, AttemptId::new(8));
    }
}
