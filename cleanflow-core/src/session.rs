//! Signed-in user state shared by the coordinator and the refresh loop.

use cleanflow_model::User;
use std::sync::Arc;
use tokio::sync::watch;

/// Authentication state of the current app session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(User),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            SessionState::SignedOut => None,
        }
    }
}

/// Session store backed by a watch channel so readers never block writers
#[derive(Clone, Debug)]
pub struct SessionStore {
    sender: Arc<watch::Sender<SessionState>>,
    receiver: watch::Receiver<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(SessionState::SignedOut);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn signed_in(user: User) -> Self {
        let store = Self::new();
        store.sign_in(user);
        store
    }

    pub fn current(&self) -> SessionState {
        self.receiver.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.receiver.borrow().user().cloned()
    }

    pub fn is_signed_in(&self) -> bool {
        self.receiver.borrow().is_signed_in()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.receiver.clone()
    }

    pub fn sign_in(&self, user: User) {
        // send_replace never fails, even with no receivers left
        self.sender.send_replace(SessionState::SignedIn(user));
    }

    pub fn sign_out(&self) {
        self.sender.send_replace(SessionState::SignedOut);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_and_out_notify_subscribers() {
        let store = SessionStore::new();
        let mut updates = store.subscribe();
        assert!(!store.is_signed_in());

        store.sign_in(User::new("u-7", "Robin"));
        updates.changed().await.expect("sender alive");
        assert_eq!(
            updates.borrow().user().map(|u| u.display_name.as_str()),
            Some("Robin")
        );
        assert_eq!(store.current_user().map(|u| u.id.to_string()), Some("u-7".into()));

        store.sign_out();
        assert_eq!(store.current(), SessionState::SignedOut);
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::new();
        let clone = store.clone();
        store.sign_in(User::new("u-1", "Ash"));
        assert!(clone.is_signed_in());
    }
}
