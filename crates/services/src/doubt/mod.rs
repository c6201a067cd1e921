//! Multi-turn doubt solving with rollback on failed turns.

mod engine;

pub use engine::{DoubtEngine, DoubtPhase, DoubtSnapshot};
