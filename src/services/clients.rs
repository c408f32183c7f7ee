//! Client registry — one session gate per browser.
//!
//! ARCHITECTURE
//! ============
//! A browser is identified by an opaque cookie token. Its `ClientSession`
//! owns the identity channel, the `SessionContext` and the watcher task that
//! connects the two. Removing a client drops the watcher handle, which
//! releases the identity subscription.
//!
//! TRADE-OFFS
//! ==========
//! Clients live only in memory. A restart signs everyone out, which matches
//! the session lifetime of a single-page app instance.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::LookupPolicy;
use crate::services::identity::LocalIdentity;
use crate::services::records::RecordStore;
use crate::services::watcher::{WatcherHandle, spawn_session_watcher};
use crate::session::SessionContext;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex client token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// CLIENT SESSION
// =============================================================================

/// Session gate of one browser.
pub struct ClientSession {
    pub identity: LocalIdentity,
    pub context: SessionContext,
    last_seen: Mutex<Instant>,
    watcher: WatcherHandle,
}

impl ClientSession {
    fn start(store: Arc<dyn RecordStore>, policy: LookupPolicy, now: Instant) -> Self {
        let identity = LocalIdentity::new();
        let context = SessionContext::new();
        let watcher = spawn_session_watcher(&identity, store, context.clone(), policy);
        debug_assert_eq!(identity.subscriber_count(), 1);
        Self { identity, context, last_seen: Mutex::new(now), watcher }
    }

    fn touch(&self, now: Instant) {
        *self
            .last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self
            .last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        now.saturating_duration_since(last_seen)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, Arc<ClientSession>>>>,
    store: Arc<dyn RecordStore>,
    policy: LookupPolicy,
}

impl ClientRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, policy: LookupPolicy) -> Self {
        Self { clients: Arc::new(RwLock::new(HashMap::new())), store, policy }
    }

    /// Look up a known client and mark it active.
    /// A client whose watcher has stopped would keep a frozen session, so it
    /// is dropped from the registry instead.
    pub async fn get(&self, token: &str) -> Option<Arc<ClientSession>> {
        {
            let clients = self.clients.read().await;
            let client = clients.get(token)?;
            if !client.watcher.is_finished() {
                client.touch(Instant::now());
                return Some(Arc::clone(client));
            }
        }

        let mut clients = self.clients.write().await;
        if clients.get(token).is_some_and(|c| c.watcher.is_finished()) {
            clients.remove(token);
            debug!("removed client session with stopped watcher");
        }
        None
    }

    /// Resolve the client for `token`, registering a new one when the token is
    /// missing or unknown. Returns the token in use and whether it is new.
    pub async fn get_or_create(&self, token: Option<&str>) -> (String, Arc<ClientSession>, bool) {
        if let Some(token) = token {
            if let Some(client) = self.get(token).await {
                return (token.to_owned(), client, false);
            }
        }

        let token = generate_token();
        let client = Arc::new(ClientSession::start(Arc::clone(&self.store), self.policy, Instant::now()));
        self.clients
            .write()
            .await
            .insert(token.clone(), Arc::clone(&client));
        debug!("registered new client session");
        (token, client, true)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Drop clients idle for longer than `idle`. Returns how many were evicted.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        self.evict_idle_at(Instant::now(), idle).await
    }

    pub(crate) async fn evict_idle_at(&self, now: Instant, idle: Duration) -> usize {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, client| client.idle_for(now) <= idle);
        before - clients.len()
    }
}

/// Spawn the background sweep that evicts idle clients. Returns a handle for shutdown.
pub fn spawn_client_sweeper(registry: ClientRegistry, interval: Duration, idle: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), idle_secs = idle.as_secs(), "client sweeper configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(idle).await;
            if evicted > 0 {
                let remaining = registry.len().await;
                info!(evicted, remaining, "evicted idle client sessions");
            }
        }
    })
}

#[cfg(test)]
#[path = "clients_test.rs"]
mod tests;
