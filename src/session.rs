//! Session model — principal, role and the per-client derived session state.
//!
//! DESIGN
//! ======
//! `SessionContext` wraps a `watch` channel holding the current
//! `SessionState`. The session watcher is its only writer; HTTP handlers and
//! the router only ever read snapshots. Every write carries the generation of
//! the identity event it resolves, and writes from superseded generations are
//! rejected so a slow role lookup can never overwrite a newer sign-out.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

// =============================================================================
// PRINCIPAL
// =============================================================================

/// Identity issued by the identity provider for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque provider-issued identifier. Keys the user's role record.
    pub uid: String,
    pub email: Option<String>,
}

impl Principal {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

// =============================================================================
// ROLE
// =============================================================================

/// Role attribute of a user record.
///
/// Strings outside the known set are preserved as `Unrecognized` so callers can
/// tell "no role" apart from "a role we do not authorize".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Faculty,
    Student,
    Unrecognized(String),
}

impl Role {
    /// Parse a stored role string. Matching is exact, as stored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Self::Admin,
            "faculty" => Self::Faculty,
            "student" => Self::Student,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    /// Lowercase wire name, or the raw string for unrecognized roles.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Faculty => "faculty",
            Self::Student => "student",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Whether this role grants access to any route tree.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Derived, client-local view of who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub principal: Option<Principal>,
    pub role: Option<Role>,
    /// True until the first identity event has fully resolved.
    pub loading: bool,
    /// True while the role of a newly signed-in principal is being looked up
    /// after the first resolution. Carries no role.
    pub resolving: bool,
    /// Generation of the identity event this state reflects. Zero while loading.
    pub generation: u64,
}

impl SessionState {
    /// Initial state: nothing resolved yet.
    #[must_use]
    pub fn loading() -> Self {
        Self { principal: None, role: None, loading: true, resolving: false, generation: 0 }
    }

    /// Resolved state for a signed-out client.
    #[must_use]
    pub fn anonymous(generation: u64) -> Self {
        Self { principal: None, role: None, loading: false, resolving: false, generation }
    }

    /// Resolved state for a signed-in principal. `role` is `None` when the
    /// record or its role field is missing, or the lookup failed.
    #[must_use]
    pub fn signed_in(principal: Principal, role: Option<Role>, generation: u64) -> Self {
        Self { principal: Some(principal), role, loading: false, resolving: false, generation }
    }

    /// Principal known, role lookup still in flight.
    #[must_use]
    pub fn resolving(principal: Principal, generation: u64) -> Self {
        Self { principal: Some(principal), role: None, loading: false, resolving: true, generation }
    }

    /// Neither the first resolution nor a role lookup is pending.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.resolving
    }

    /// Coarse state-machine phase of this snapshot.
    #[must_use]
    pub fn phase(&self) -> Phase<'_> {
        if !self.is_settled() {
            Phase::Loading
        } else if self.principal.is_none() {
            Phase::Anonymous
        } else {
            Phase::Authenticated(self.role.as_ref())
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::loading()
    }
}

/// Gate state machine: `Loading -> Anonymous | Authenticated(role)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<'a> {
    Loading,
    Anonymous,
    Authenticated(Option<&'a Role>),
}

// =============================================================================
// SESSION CONTEXT
// =============================================================================

/// Injectable handle to one client's session state.
///
/// Clone is cheap; all clones observe the same channel.
#[derive(Clone)]
pub struct SessionContext {
    tx: watch::Sender<SessionState>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::loading());
        Self { tx }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Replace the state unless it comes from an older generation than the
    /// one already published. Returns whether the write was applied.
    pub fn apply(&self, next: SessionState) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|current| {
            if next.generation < current.generation {
                return false;
            }
            applied = true;
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        applied
    }

    /// Wait until `predicate` holds for the published state, or `limit` elapses.
    /// Returns the last observed snapshot either way.
    pub async fn wait_for<F>(&self, limit: Duration, predicate: F) -> SessionState
    where
        F: Fn(&SessionState) -> bool,
    {
        let mut rx = self.watch();
        let waited = tokio::time::timeout(limit, rx.wait_for(|state| predicate(state))).await;
        match waited {
            Ok(Ok(state)) => state.clone(),
            _ => self.snapshot(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
