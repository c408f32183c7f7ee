//! Identity provider boundary — session-change subscriptions.
//!
//! ARCHITECTURE
//! ============
//! A provider hands out [`Subscription`]s. The first `next()` yields the
//! current principal (or `None`) right away, later calls yield each change.
//! Dropping the subscription unsubscribes.
//!
//! [`LocalIdentity`] is the per-client provider: sign-in and sign-out
//! handlers publish into it after the [`Authenticator`](super::authenticator)
//! accepted the credentials. Changes are coalesced, so a subscriber that falls
//! behind only ever sees the newest principal.

use std::sync::Arc;

use tokio::sync::watch;

use crate::session::Principal;

pub trait IdentityProvider: Send + Sync {
    fn subscribe(&self) -> Subscription;
}

/// Live registration with an identity provider. Drop to unsubscribe.
pub struct Subscription {
    rx: watch::Receiver<Option<Principal>>,
    delivered_initial: bool,
}

impl Subscription {
    #[must_use]
    pub fn new(rx: watch::Receiver<Option<Principal>>) -> Self {
        Self { rx, delivered_initial: false }
    }

    /// Wait for the next session change.
    ///
    /// Returns `None` once the provider is gone. Cancel safe.
    pub async fn next(&mut self) -> Option<Option<Principal>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// In-process identity channel for one client.
#[derive(Clone)]
pub struct LocalIdentity {
    tx: Arc<watch::Sender<Option<Principal>>>,
}

impl LocalIdentity {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a signed-in principal. Re-publishing the same principal still
    /// notifies subscribers so the role is looked up again.
    pub fn sign_in(&self, principal: Principal) {
        self.tx.send_replace(Some(principal));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<Principal> {
        self.tx.borrow().clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for LocalIdentity {
    fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
