//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FIREBASE_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_ROLE_LOOKUP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ROLE_LOOKUP_RETRIES: u32 = 1;
pub const MAX_ROLE_LOOKUP_RETRIES: u32 = 1;
pub const DEFAULT_SIGN_IN_SETTLE_MS: u64 = 2000;
pub const DEFAULT_CLIENT_IDLE_SECS: u64 = 1800;
pub const DEFAULT_CLIENT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("missing required env var {0}")]
    Missing(&'static str),
}

/// How sign-in credentials are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthProviderConfig {
    /// Firebase Auth `accounts:signInWithPassword`.
    Firebase { api_key: String, base_url: String },
    /// Accept any password; uid is the email's local part.
    Dev,
}

/// Where role records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStoreConfig {
    /// In-process store, optionally seeded from a YAML `uid: role` map.
    Memory { seed_file: Option<PathBuf> },
    Firestore { project_id: String, base_url: String, bearer_token: Option<String> },
    Postgres { database_url: String, max_connections: u32 },
}

/// Bounds on a single role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Extra attempts after a failed one. Never more than one.
    pub retries: u32,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self { timeout: Duration::from_millis(DEFAULT_ROLE_LOOKUP_TIMEOUT_MS), retries: DEFAULT_ROLE_LOOKUP_RETRIES }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub auth: AuthProviderConfig,
    pub store: RoleStoreConfig,
    pub lookup: LookupPolicy,
    /// How long sign-in waits for the watcher to publish the new session.
    pub sign_in_settle: Duration,
    /// Clients idle longer than this are evicted.
    pub client_idle: Duration,
    pub client_sweep_interval: Duration,
    pub cookie_secure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth: AuthProviderConfig::Dev,
            store: RoleStoreConfig::Memory { seed_file: None },
            lookup: LookupPolicy::default(),
            sign_in_settle: Duration::from_millis(DEFAULT_SIGN_IN_SETTLE_MS),
            client_idle: Duration::from_secs(DEFAULT_CLIENT_IDLE_SECS),
            client_sweep_interval: Duration::from_secs(DEFAULT_CLIENT_SWEEP_INTERVAL_SECS),
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `AUTH_PROVIDER`: `dev` (default) or `firebase` (needs `FIREBASE_API_KEY`)
    /// - `FIREBASE_AUTH_BASE_URL`: default Google identity toolkit URL
    /// - `ROLE_STORE`: `memory` (default), `firestore` or `postgres`
    /// - `ROLES_FILE`: YAML seed for the memory store
    /// - `FIRESTORE_PROJECT_ID`, `FIRESTORE_BASE_URL`, `FIRESTORE_BEARER_TOKEN`
    /// - `DATABASE_URL`: required when `ROLE_STORE=postgres`
    /// - `ROLE_LOOKUP_TIMEOUT_MS`: default 5000
    /// - `ROLE_LOOKUP_RETRIES`: default 1, capped at 1
    /// - `SIGN_IN_SETTLE_MS`: default 2000
    /// - `CLIENT_IDLE_SECS`: default 1800
    /// - `CLIENT_SWEEP_INTERVAL_SECS`: default 60
    /// - `COOKIE_SECURE`: default false
    ///
    /// # Errors
    ///
    /// Returns an error on unknown provider/store names, unparsable numbers,
    /// or a selected backend missing its required settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse_strict("PORT", DEFAULT_PORT)?;
        let auth = parse_auth_provider(env_opt("AUTH_PROVIDER").as_deref())?;
        let store = parse_role_store(env_opt("ROLE_STORE").as_deref())?;

        let lookup = LookupPolicy {
            timeout: Duration::from_millis(env_parse_strict("ROLE_LOOKUP_TIMEOUT_MS", DEFAULT_ROLE_LOOKUP_TIMEOUT_MS)?),
            retries: env_parse_strict("ROLE_LOOKUP_RETRIES", DEFAULT_ROLE_LOOKUP_RETRIES)?.min(MAX_ROLE_LOOKUP_RETRIES),
        };

        Ok(Self {
            port,
            auth,
            store,
            lookup,
            sign_in_settle: Duration::from_millis(env_parse_strict("SIGN_IN_SETTLE_MS", DEFAULT_SIGN_IN_SETTLE_MS)?),
            client_idle: Duration::from_secs(env_parse_strict("CLIENT_IDLE_SECS", DEFAULT_CLIENT_IDLE_SECS)?),
            client_sweep_interval: Duration::from_secs(env_parse_strict(
                "CLIENT_SWEEP_INTERVAL_SECS",
                DEFAULT_CLIENT_SWEEP_INTERVAL_SECS,
            )?),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    env_opt(key).and_then(|raw| match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

fn env_parse_strict<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env_opt(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Parse(format!("invalid {key}: {raw}"))),
    }
}

fn parse_auth_provider(raw: Option<&str>) -> Result<AuthProviderConfig, ConfigError> {
    match raw.unwrap_or("dev") {
        "dev" => Ok(AuthProviderConfig::Dev),
        "firebase" => {
            let api_key = env_opt("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
            let base_url = env_opt("FIREBASE_AUTH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIREBASE_AUTH_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned();
            Ok(AuthProviderConfig::Firebase { api_key, base_url })
        }
        other => Err(ConfigError::Parse(format!("unknown AUTH_PROVIDER: {other}"))),
    }
}

fn parse_role_store(raw: Option<&str>) -> Result<RoleStoreConfig, ConfigError> {
    match raw.unwrap_or("memory") {
        "memory" => Ok(RoleStoreConfig::Memory { seed_file: env_opt("ROLES_FILE").map(PathBuf::from) }),
        "firestore" => {
            let project_id = env_opt("FIRESTORE_PROJECT_ID").ok_or(ConfigError::Missing("FIRESTORE_PROJECT_ID"))?;
            let base_url = env_opt("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned();
            Ok(RoleStoreConfig::Firestore { project_id, base_url, bearer_token: env_opt("FIRESTORE_BEARER_TOKEN") })
        }
        "postgres" => {
            let database_url = env_opt("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = env_parse_strict("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
            Ok(RoleStoreConfig::Postgres { database_url, max_connections })
        }
        other => Err(ConfigError::Parse(format!("unknown ROLE_STORE: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
