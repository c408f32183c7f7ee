//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the client registry (one session gate per browser), the credential
//! checker and the parsed config. Handlers read session snapshots and publish
//! identity changes; they never write session state directly.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::authenticator::Authenticator;
use crate::services::clients::ClientRegistry;
use crate::services::records::RecordStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub clients: ClientRegistry,
    pub authenticator: Arc<dyn Authenticator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let clients = ClientRegistry::new(store, config.lookup);
        Self { clients, authenticator, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
