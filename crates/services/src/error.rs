//! Shared error types for the services crate.

use thiserror::Error;

use study_core::ValidationError;

/// Coarse failure category, used by presentation to pick how to render an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local precondition failure; nothing was sent.
    Validation,
    /// The backend rejected the credential; the session has been cleared.
    Auth,
    /// Transport failure or timeout; retry by re-invoking.
    Network,
    /// The backend answered but the operation did not succeed.
    ServerLogic,
    /// The engine is not in a state that allows the operation.
    State,
}

/// Where presentation should go after a failure. Engines never navigate themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    ShowLogin,
}

fn intent_for(kind: ErrorKind) -> Option<NavigationIntent> {
    (kind == ErrorKind::Auth).then_some(NavigationIntent::ShowLogin)
}

/// Errors returned by the backend boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not signed in or session expired")]
    Unauthorized,
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("upload is too large")]
    PayloadTooLarge,
    #[error("not found")]
    NotFound,
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    ServerLogic(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Auth,
            Self::Timeout | Self::Network(_) => ErrorKind::Network,
            Self::PayloadTooLarge
            | Self::NotFound
            | Self::Status { .. }
            | Self::ServerLogic(_)
            | Self::Decode(_) => ErrorKind::ServerLogic,
        }
    }

    #[must_use]
    pub fn navigation_intent(&self) -> Option<NavigationIntent> {
        intent_for(self.kind())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors emitted by `QuizEngine` and `QuizLoader`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz is loaded")]
    NotLoaded,
    #[error("quiz not found")]
    NotFound,
    #[error("answers can only be selected while the quiz is open")]
    NotAnswerable,
    #[error("quiz is not complete yet")]
    NotCompleted,
    #[error("a submission is already in progress")]
    AlreadyInProgress,
    #[error("attempt was already submitted")]
    AlreadySubmitted,
    #[error("attempt was replaced before the response arrived")]
    Superseded,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl QuizError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Remote(err) => err.kind(),
            Self::NotFound => ErrorKind::ServerLogic,
            Self::NotLoaded
            | Self::NotAnswerable
            | Self::NotCompleted
            | Self::AlreadyInProgress
            | Self::AlreadySubmitted
            | Self::Superseded => ErrorKind::State,
        }
    }

    #[must_use]
    pub fn navigation_intent(&self) -> Option<NavigationIntent> {
        intent_for(self.kind())
    }
}

/// Errors emitted by `DoubtEngine`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DoubtError {
    #[error("a request is already in progress")]
    Busy,
    #[error("the conversation has already started")]
    AlreadyStarted,
    #[error("ask a first question before following up")]
    NotStarted,
    #[error("the conversation was reset before the response arrived")]
    Superseded,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl DoubtError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Remote(err) => err.kind(),
            Self::Busy | Self::AlreadyStarted | Self::NotStarted | Self::Superseded => {
                ErrorKind::State
            }
        }
    }

    #[must_use]
    pub fn navigation_intent(&self) -> Option<NavigationIntent> {
        intent_for(self.kind())
    }
}

/// Errors emitted by `HistoryService` and account calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl AccountError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Remote(err) => err.kind(),
        }
    }

    #[must_use]
    pub fn navigation_intent(&self) -> Option<NavigationIntent> {
        intent_for(self.kind())
    }
}

/// Errors raised while reading configuration or building the HTTP client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url `{raw}`: {source}")]
    BaseUrl {
        raw: String,
        source: url::ParseError,
    },
    #[error("invalid value for {var}: `{raw}`")]
    InvalidNumber { var: &'static str, raw: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}
