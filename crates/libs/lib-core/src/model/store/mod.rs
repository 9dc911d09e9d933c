//! # Database Store
//!
//! Database connection pool, migrations and repository implementations.

// region: --- Modules
pub mod models;
pub mod query;
pub mod reference;
pub mod user_repository;
pub mod wire_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use query::WireQuery;
pub use user_repository::UserRepository;
pub use wire_repository::{WireRepository, WireUpdateOutcome};
// endregion: --- Re-exports

// region: --- Types and Functions
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::Result;

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a new SQLite connection pool, creating the database file (and its
/// directory) when missing.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    if let Some(db_path) = database_url.strip_prefix("sqlite:") {
        let db_path = db_path.trim_start_matches("//");
        if !db_path.starts_with(":memory:") {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        crate::AppError::Storage(format!("Failed to create database directory: {e}"))
                    })?;
                    info!("Created database directory: {:?}", parent);
                }
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    Ok(pool)
}

/// Apply pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Fresh in-memory database with the schema applied.
///
/// Capped at one connection: every `:memory:` connection is its own database.
pub async fn create_memory_pool() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
// endregion: --- Types and Functions
