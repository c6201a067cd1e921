#![forbid(unsafe_code)]

pub mod auth;
pub mod doubt;
pub mod error;
pub mod history_service;
pub mod logging;
pub mod quiz;
pub mod remote;
pub mod session_store;

pub use study_core::Clock;

pub use auth::{AuthGate, AuthSession, AuthToken, AuthWatcher, GateDecision};
pub use doubt::{DoubtEngine, DoubtPhase, DoubtSnapshot};
pub use error::{
    AccountError, ConfigError, DoubtError, ErrorKind, NavigationIntent, QuizError, RemoteError,
};
pub use history_service::HistoryService;
pub use quiz::{AttemptMetadata, QuizEngine, QuizLoader, QuizPhase, QuizSnapshot, QuizSource};
pub use remote::{BackendApi, HttpBackend, RemoteConfig, RemoteService};
pub use session_store::SessionStore;
