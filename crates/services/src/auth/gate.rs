use tokio::sync::watch;

use super::session::{AuthSession, AuthToken};

/// What a protected view should mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Protected,
    Login,
}

impl GateDecision {
    fn from_token(token: Option<&AuthToken>) -> Self {
        if token.is_some() {
            Self::Protected
        } else {
            Self::Login
        }
    }

    /// Build the protected content or the login entry point in its place.
    pub fn select<T>(self, protected: impl FnOnce() -> T, login: impl FnOnce() -> T) -> T {
        match self {
            Self::Protected => protected(),
            Self::Login => login(),
        }
    }
}

/// Presence of a token is enough to render; validity is left to the backend.
#[derive(Debug, Clone)]
pub struct AuthGate {
    session: AuthSession,
}

impl AuthGate {
    #[must_use]
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn decide(&self) -> GateDecision {
        GateDecision::from_token(self.session.token().as_ref())
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.decide() == GateDecision::Protected
    }

    /// Subscribe to decision changes, one watcher per mounted view.
    #[must_use]
    pub fn watch(&self) -> AuthWatcher {
        self.session.subscribe()
    }
}

/// Re-evaluates the gate whenever the session changes.
#[derive(Debug)]
pub struct AuthWatcher {
    rx: watch::Receiver<Option<AuthToken>>,
}

impl AuthWatcher {
    pub(super) fn new(rx: watch::Receiver<Option<AuthToken>>) -> Self {
        Self { rx }
    }

    #[must_use]
    pub fn decision(&self) -> GateDecision {
        GateDecision::from_token(self.rx.borrow().as_ref())
    }

    /// Wait for the next session transition and return the new decision.
    ///
    /// Returns `None` once every handle to the session has been dropped.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        self.rx.changed().await.ok()?;
        Some(GateDecision::from_token(self.rx.borrow_and_update().as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_presence_decides() {
        let session = AuthSession::new();
        let gate = AuthGate::new(session.clone());
        assert_eq!(gate.decide(), GateDecision::Login);

        session.sign_in(AuthToken::new("t"));
        assert!(gate.is_authorized());
        assert_eq!(
            gate.decide().select(|| "dashboard", || "login"),
            "dashboard"
        );
    }

    #[tokio::test]
    async fn watchers_see_forced_invalidation() {
        let session = AuthSession::with_token(AuthToken::new("t"));
        let gate = AuthGate::new(session.clone());
        let mut quiz_view = gate.watch();
        let mut doubt_view = gate.watch();
        assert_eq!(quiz_view.decision(), GateDecision::Protected);

        session.invalidate();

        assert_eq!(quiz_view.changed().await, Some(GateDecision::Login));
        assert_eq!(doubt_view.changed().await, Some(GateDecision::Login));
    }
}
