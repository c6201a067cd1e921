use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use super::gate::AuthWatcher;

/// Opaque bearer credential issued by the backend on login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// The single credential slot shared by every authenticated call.
///
/// Clones share the same slot. Every transition is broadcast to watchers so
/// gated views re-evaluate when the backend forces a sign-out.
#[derive(Clone)]
pub struct AuthSession {
    slot: Arc<watch::Sender<Option<AuthToken>>>,
}

impl AuthSession {
    #[must_use]
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    #[must_use]
    pub fn with_token(token: AuthToken) -> Self {
        let session = Self::new();
        session.slot.send_replace(Some(token));
        session
    }

    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.slot.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn sign_in(&self, token: AuthToken) {
        self.slot.send_replace(Some(token));
        tracing::info!("signed in");
    }

    pub fn sign_out(&self) {
        self.slot.send_replace(None);
        tracing::info!("signed out");
    }

    /// Drop the token after the backend rejected it.
    pub fn invalidate(&self) {
        if self.slot.send_replace(None).is_some() {
            tracing::warn!("session invalidated by backend");
        }
    }

    /// Watch gate decisions driven by this session.
    #[must_use]
    pub fn subscribe(&self) -> AuthWatcher {
        AuthWatcher::new(self.slot.subscribe())
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_slot() {
        let session = AuthSession::new();
        let other = session.clone();
        session.sign_in(AuthToken::new("abc"));
        assert_eq!(other.token().unwrap().as_str(), "abc");

        other.invalidate();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AuthToken::new("secret")), "AuthToken(..)");
    }
}
