//! Authentication state as an explicit, injected dependency.
//!
//! The cart engine never reads ambient auth state. It consumes a
//! `watch::Receiver<Identity>` handed to it at construction; the
//! [`AuthChannel`] is the producing side, driven by whatever owns the login
//! session. This keeps the store testable with a fake identity source.

use std::sync::Arc;

use tokio::sync::watch;
use zella_core::UserId;

/// The current identity: `None` while anonymous.
pub type Identity = Option<UserId>;

/// Producing side of the auth signal.
///
/// Cheaply cloneable; all clones feed the same set of subscribers.
#[derive(Debug, Clone)]
pub struct AuthChannel {
    tx: Arc<watch::Sender<Identity>>,
}

impl AuthChannel {
    /// Create a channel starting in the anonymous state.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            tx: Arc::new(watch::channel(None).0),
        }
    }

    /// Create a channel starting already authenticated.
    #[must_use]
    pub fn authenticated(user: UserId) -> Self {
        Self {
            tx: Arc::new(watch::channel(Some(user)).0),
        }
    }

    /// Signal a transition to the authenticated state.
    pub fn login(&self, user: UserId) {
        self.tx.send_replace(Some(user));
    }

    /// Signal a transition back to the anonymous state.
    pub fn logout(&self) {
        self.tx.send_replace(None);
    }

    /// Subscribe to identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.tx.subscribe()
    }

    /// The identity as of now.
    #[must_use]
    pub fn current(&self) -> Identity {
        self.tx.borrow().clone()
    }

    /// Whether a user is currently signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl Default for AuthChannel {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout_toggle() {
        let auth = AuthChannel::anonymous();
        assert!(!auth.is_authenticated());

        auth.login(UserId::new("u-1"));
        assert!(auth.is_authenticated());
        assert_eq!(auth.current(), Some(UserId::new("u-1")));

        auth.logout();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.current(), None);
    }

    #[tokio::test]
    async fn test_subscriber_observes_transition() {
        let auth = AuthChannel::anonymous();
        let mut rx = auth.subscribe();

        auth.login(UserId::new("u-1"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        auth.logout();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
