//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::services::CategoryService;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// SQLite connection pool.
    db: SqlitePool,

    /// Category hierarchy service (single writer, name cache).
    categories: Arc<CategoryService>,
}

impl AppState {
    /// Open the database, apply migrations and build the services.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        info!(url = %config.database_url, "connected to SQLite");

        db::run_migrations(&pool).await?;
        info!("database migrations applied");

        Ok(Self::from_pool(pool))
    }

    /// Build the state around an already-migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        let categories = CategoryService::new(pool.clone());
        Self {
            inner: Arc::new(AppStateInner {
                db: pool,
                categories,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the category service.
    pub fn categories(&self) -> &Arc<CategoryService> {
        &self.inner.categories
    }

    /// Check if the database is reachable.
    pub async fn database_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
