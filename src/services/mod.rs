//! Domain services behind the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `identity` and `records` are the two external boundaries (session-change
//! subscriptions and role records). `watcher` connects them into a client's
//! session state, and `clients` owns one watcher per browser.

pub mod authenticator;
pub mod clients;
pub mod firestore;
pub mod identity;
pub mod postgres;
pub mod records;
pub mod watcher;

use std::sync::Arc;

use tracing::info;

use crate::config::RoleStoreConfig;
use records::{MemoryStore, RecordStore, StoreError};

/// Open the record store selected by config.
///
/// # Errors
///
/// Returns an error if the seed file, HTTP client or database cannot be set up.
pub async fn open_record_store(config: &RoleStoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    match config {
        RoleStoreConfig::Memory { seed_file: None } => {
            info!("role store: memory (empty)");
            Ok(Arc::new(MemoryStore::new()))
        }
        RoleStoreConfig::Memory { seed_file: Some(path) } => {
            let store = MemoryStore::from_yaml_file(path).await?;
            info!(path = %path.display(), "role store: memory (seeded)");
            Ok(Arc::new(store))
        }
        RoleStoreConfig::Firestore { project_id, base_url, bearer_token } => {
            let store = firestore::FirestoreStore::new(base_url.clone(), project_id.clone(), bearer_token.clone())?;
            info!(%project_id, "role store: firestore");
            Ok(Arc::new(store))
        }
        RoleStoreConfig::Postgres { database_url, max_connections } => {
            let pool = crate::db::init_pool(database_url, *max_connections)
                .await
                .map_err(|e| StoreError::Unavailable(format!("database init: {e}")))?;
            info!(max_connections, "role store: postgres");
            Ok(Arc::new(postgres::PgRecordStore::new(pool)))
        }
    }
}
