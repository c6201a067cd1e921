use thiserror::Error;

use crate::model::AnswerKey;

/// Local precondition failures. These never reach the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("question cannot be blank")]
    BlankQuestion,

    #[error("follow-up cannot be blank")]
    BlankFollowUp,

    #[error("subject cannot be blank")]
    BlankSubject,

    #[error("expected {expected} file, got `{actual}`")]
    WrongMediaType {
        expected: &'static str,
        actual: String,
    },

    #[error("file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("file is empty")]
    EmptyFile,

    #[error("unknown option key `{0}`")]
    UnknownOption(String),

    #[error("no question at {0}")]
    UnknownQuestion(AnswerKey),

    #[error("question {0} has an empty prompt")]
    EmptyPrompt(AnswerKey),

    #[error("attempt has no quiz id to submit against")]
    MissingQuizId,

    #[error("page limit must be at least 1")]
    EmptyPage,

    #[error("{0} cannot be blank")]
    BlankField(&'static str),

    #[error("an assistant turn cannot open a conversation")]
    AssistantFirst,
}
