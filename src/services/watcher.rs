//! Session watcher — the only writer of a client's `SessionState`.
//!
//! DESIGN
//! ======
//! One task per client holds one identity subscription. Each identity event
//! gets a fresh generation. Signed-out events are applied immediately;
//! signed-in events publish a role-less "resolving" state (after the first
//! resolution) and start a role lookup whose future is stored in `pending`.
//! A newer event drops that future before it can finish, and
//! `SessionContext::apply` refuses older generations, so the published state
//! always follows the most recent principal.
//!
//! ERROR HANDLING
//! ==============
//! Lookups are bounded: every attempt has a timeout and at most one retry is
//! made. A lookup that still fails resolves to "no role" with a warning, which
//! the router turns into a redirect to `/login`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{LookupPolicy, MAX_ROLE_LOOKUP_RETRIES};
use crate::services::identity::{IdentityProvider, Subscription};
use crate::services::records::{RecordStore, StoreError, USERS_COLLECTION, role_from_record};
use crate::session::{Principal, Role, SessionContext, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("role lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Running watcher. Dropping the handle stops the task and releases the
/// identity subscription.
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the task. The subscription is released once it unwinds.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Subscribe to `provider` and spawn the watcher task.
///
/// The subscription is registered before this returns, so exactly one
/// listener exists per call.
pub fn spawn_session_watcher(
    provider: &dyn IdentityProvider,
    store: Arc<dyn RecordStore>,
    ctx: SessionContext,
    policy: LookupPolicy,
) -> WatcherHandle {
    let subscription = provider.subscribe();
    let task = tokio::spawn(run(subscription, store, ctx, policy));
    WatcherHandle { task }
}

type Resolution = (u64, Principal, Option<Role>);

async fn run(mut subscription: Subscription, store: Arc<dyn RecordStore>, ctx: SessionContext, policy: LookupPolicy) {
    let mut generation: u64 = 0;
    let mut pending: Option<BoxFuture<'static, Resolution>> = None;

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(principal) = event else {
                    debug!("identity provider closed; session watcher stopping");
                    break;
                };
                generation += 1;
                if pending.take().is_some() {
                    debug!(generation, "superseded in-flight role lookup");
                }
                match principal {
                    None => {
                        ctx.apply(SessionState::anonymous(generation));
                        debug!(generation, "session signed out");
                    }
                    Some(principal) => {
                        // Once resolved, the previous principal's role must not outlive the switch.
                        if !ctx.snapshot().loading {
                            ctx.apply(SessionState::resolving(principal.clone(), generation));
                            debug!(uid = %principal.uid, generation, "resolving role for new principal");
                        }
                        let store = Arc::clone(&store);
                        let lookup: BoxFuture<'static, Resolution> = Box::pin(async move {
                            let role = resolve_role(store.as_ref(), &principal.uid, policy).await;
                            (generation, principal, role)
                        });
                        pending = Some(lookup);
                    }
                }
            }
            (resolved_generation, principal, role) = poll_pending(&mut pending) => {
                pending = None;
                let uid = principal.uid.clone();
                let applied = ctx.apply(SessionState::signed_in(principal, role.clone(), resolved_generation));
                if applied {
                    info!(%uid, role = role.as_ref().map_or("none", Role::as_str), generation = resolved_generation, "session resolved");
                } else {
                    debug!(%uid, generation = resolved_generation, "discarded stale role resolution");
                }
            }
        }
    }
}

/// Await the in-flight lookup, or never complete when there is none.
async fn poll_pending(pending: &mut Option<BoxFuture<'static, Resolution>>) -> Resolution {
    match pending {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Look up a principal's role, folding every failure into `None`.
pub async fn resolve_role(store: &dyn RecordStore, uid: &str, policy: LookupPolicy) -> Option<Role> {
    match lookup_role(store, uid, policy).await {
        Ok(Some(role)) => {
            if !role.is_known() {
                warn!(%uid, %role, "user record has an unrecognized role");
            }
            Some(role)
        }
        Ok(None) => {
            debug!(%uid, "no role record for user");
            None
        }
        Err(e) => {
            warn!(%uid, error = %e, "role lookup failed; treating user as having no role");
            None
        }
    }
}

/// Fetch `users/<uid>` with a per-attempt timeout and at most one retry.
///
/// # Errors
///
/// Returns the last failure when every attempt failed.
pub async fn lookup_role(store: &dyn RecordStore, uid: &str, policy: LookupPolicy) -> Result<Option<Role>, LookupError> {
    let attempts = policy.retries.min(MAX_ROLE_LOOKUP_RETRIES) + 1;
    let mut last_err = LookupError::Timeout(policy.timeout);

    for attempt in 1..=attempts {
        match tokio::time::timeout(policy.timeout, store.get(USERS_COLLECTION, uid)).await {
            Ok(Ok(record)) => return Ok(record.as_ref().and_then(role_from_record)),
            Ok(Err(e)) => last_err = LookupError::Store(e),
            Err(_) => last_err = LookupError::Timeout(policy.timeout),
        }
        if attempt < attempts {
            debug!(%uid, attempt, error = %last_err, "retrying role lookup");
        }
    }
    Err(last_err)
}

#[cfg(test)]
#[path = "watcher_test.rs"]
mod tests;
