//! Record store boundary — role records keyed by principal uid.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session watcher reads `users/<uid>` through [`RecordStore`] and never
//! writes. Backends: [`MemoryStore`] (optionally seeded from YAML),
//! Firestore over REST and Postgres.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::session::Role;

/// Collection holding one record per user, keyed by principal uid.
pub const USERS_COLLECTION: &str = "users";

/// A fetched document: flat field map.
pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or answered with a server error.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    /// The store answered but the document could not be decoded.
    #[error("record decode failed: {0}")]
    Decode(String),
    #[error("record store seed failed: {0}")]
    Seed(String),
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record. `Ok(None)` means the record does not exist.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError>;
}

/// Extract the role attribute. Missing or non-string `role` fields yield `None`.
#[must_use]
pub fn role_from_record(record: &Record) -> Option<Role> {
    record.get("role").and_then(Value::as_str).map(Role::parse)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process record store. Used for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Record>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn put(&self, collection: &str, key: &str, record: Record) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(key.to_owned(), record);
    }

    /// Insert a `users/<uid>` record carrying only a role string.
    pub async fn put_role(&self, uid: &str, role: &str) {
        let mut record = Record::new();
        record.insert("role".into(), Value::String(role.to_owned()));
        self.put(USERS_COLLECTION, uid, record).await;
    }

    /// Build a store from a YAML document mapping uid to role.
    ///
    /// ```yaml
    /// alice: admin
    /// bob: student
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is not a string-to-string map.
    pub async fn from_yaml(yaml: &str) -> Result<Self, StoreError> {
        let roles: HashMap<String, String> =
            serde_yaml::from_str(yaml).map_err(|e| StoreError::Seed(e.to_string()))?;
        let store = Self::new();
        for (uid, role) in &roles {
            store.put_role(uid, role).await;
        }
        Ok(store)
    }

    /// Build a store from a YAML seed file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_yaml_file(path: &Path) -> Result<Self, StoreError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&yaml).await
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
