//! Database connection and schema management.
//!
//! The schema is carried to its current shape by an ordered list of discrete
//! migration steps. Every step is idempotent DDL, runs in its own
//! transaction and records its version inside that same transaction, so a
//! crash between steps leaves the database at a well-defined version and the
//! next startup resumes from there.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::error::CoreError;

// Re-export the pool for use in other parts of the core crate
pub use sqlx::SqlitePool as DbPool;

/// Establishes a connection pool to the SQLite database and brings the
/// schema up to date.
///
/// # Arguments
///
/// * `db_path` - The path to the SQLite database file.
///
/// # Returns
///
/// A `Result` containing the `SqlitePool` or a `CoreError` if the connection
/// fails or a migration cannot be applied.
pub async fn establish_connection(db_path: &str) -> Result<SqlitePool, CoreError> {
    // Create the database file and directory if they don't exist
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    if !Path::new(db_path).exists() {
        tokio::fs::File::create(db_path).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_path)
        .await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

/// Applies PRAGMAs and any migration steps the database has not seen yet.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), CoreError> {
    tracing::info!("Initializing database schema");

    // WAL survives in the database file; foreign_keys is per connection
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?;

    tracing::debug!("Current database version: {}", current_version);

    apply_migrations(pool, current_version).await?;

    Ok(())
}

async fn apply_migrations(pool: &SqlitePool, current_version: i32) -> Result<(), CoreError> {
    for (version, sql) in migrations() {
        if version <= current_version {
            continue;
        }

        tracing::info!("Applying migration version {}", version);

        let mut tx = pool.begin().await?;

        for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        // version is recorded in the step's own transaction
        sqlx::query("INSERT INTO migrations (version) VALUES ($1)")
            .bind(version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}

fn migrations() -> Vec<(i32, &'static str)> {
    vec![
        (1, include_str!("db/migrations/001_initial_schema.sql")),
        (2, include_str!("db/migrations/002_work_units.sql")),
        (3, include_str!("db/migrations/003_settings.sql")),
    ]
}
