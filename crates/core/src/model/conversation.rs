use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

/// One message in a doubt-solving exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Length marker taken before an optimistic append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Append-only message history. The first turn, if any, is a user turn.
///
/// The only way to shrink a conversation is `restore`, which rolls back to a
/// checkpoint taken earlier on the same conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation(Vec<ConversationTurn>);

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the opening question together with its answer.
    ///
    /// Returns `false` without mutating if the conversation already started.
    pub fn open(&mut self, question: impl Into<String>, answer: impl Into<String>) -> bool {
        if !self.0.is_empty() {
            return false;
        }
        self.0.push(ConversationTurn::user(question));
        self.0.push(ConversationTurn::assistant(answer));
        true
    }

    /// Append a user turn, returning the checkpoint to roll back to.
    pub fn push_user(&mut self, content: impl Into<String>) -> Checkpoint {
        let checkpoint = self.checkpoint();
        self.0.push(ConversationTurn::user(content));
        checkpoint
    }

    /// Append an assistant turn.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AssistantFirst` if the conversation is empty.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::AssistantFirst);
        }
        self.0.push(ConversationTurn::assistant(content));
        Ok(())
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.0.len())
    }

    /// Drop every turn appended after `checkpoint`.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.0.truncate(checkpoint.0);
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text of the question that opened the conversation.
    #[must_use]
    pub fn opening_question(&self) -> Option<&str> {
        self.0.first().map(|turn| turn.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_appends_question_and_answer_once() {
        let mut conversation = Conversation::new();
        assert!(conversation.open("What is X?", "X is Y."));
        assert!(!conversation.open("Again?", "No."));
        assert_eq!(
            conversation.turns(),
            &[
                ConversationTurn::user("What is X?"),
                ConversationTurn::assistant("X is Y.")
            ]
        );
    }

    #[test]
    fn restore_rolls_back_optimistic_turn() {
        let mut conversation = Conversation::new();
        conversation.open("q", "a");
        let before = conversation.clone();

        let checkpoint = conversation.push_user("And why?");
        assert_eq!(conversation.len(), 3);
        conversation.restore(checkpoint);

        assert_eq!(conversation, before);
    }

    #[test]
    fn assistant_cannot_open() {
        let mut conversation = Conversation::new();
        assert_eq!(
            conversation.push_assistant("hi"),
            Err(ValidationError::AssistantFirst)
        );
    }

    #[test]
    fn opening_question_survives_follow_ups() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.opening_question(), None);
        conversation.open("What is X?", "X is Y.");
        conversation.push_user("And why?");
        assert_eq!(conversation.opening_question(), Some("What is X?"));
    }

    #[test]
    fn role_accepts_legacy_ai_alias() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"role":"ai","content":"hello"}"#).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(
            serde_json::to_string(&turn).unwrap(),
            r#"{"role":"assistant","content":"hello"}"#
        );
    }
}
