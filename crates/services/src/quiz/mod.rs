//! Quiz attempt lifecycle: loading, answering, scoring and submission.

mod engine;
mod loader;

pub use engine::{AttemptMetadata, LoadTicket, QuizEngine, QuizPhase, QuizSnapshot, QuizSource};
pub use loader::QuizLoader;
