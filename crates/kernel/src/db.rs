//! Database connection pool management.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::Config;

/// Create a SQLite connection pool.
///
/// An in-memory database exists once per connection, so such pools are
/// pinned to a single connection that is never recycled.
pub async fn create_pool(config: &Config) -> Result<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.database_url)
        .context("DATABASE_URL is not a valid SQLite URL")?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(config.database_busy_timeout);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(config.database_max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to open SQLite database")?;

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    Ok(())
}

/// A migrated in-memory database, used by tests.
pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = create_pool(&Config::in_memory()).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
