//! Postgres pool for the role-record store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Only opened when `ROLE_STORE=postgres`. The gate never writes role
//! records; the embedded migration just guarantees the `users` table the
//! store reads from exists before the first lookup.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect to `database_url` and apply the `users` table migration.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    Ok(pool)
}
