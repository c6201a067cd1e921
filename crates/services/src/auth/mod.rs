mod gate;
mod session;

pub use gate::{AuthGate, AuthWatcher, GateDecision};
pub use session::{AuthSession, AuthToken};
