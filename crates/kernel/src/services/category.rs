//! Category service with caching.
//!
//! Owns the pool-level concerns of the category tree: one transaction per
//! structural change, a single writer at a time, and a DashMap cache for
//! name lookups.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{
    Category, CategoryTotal, CreateCategory, PathEntry, Suggestion, TransactionFilter,
    UpdateCategory,
};

/// Service for the category hierarchy.
pub struct CategoryService {
    pool: SqlitePool,
    /// Held across begin → widen → insert → commit so insertions never
    /// compute their threshold from a stale layout. Renames and cache fills
    /// take it too, so a fill can never race an invalidation.
    writer: Mutex<()>,
    /// Cache: category id -> name
    name_cache: DashMap<i64, String>,
}

impl CategoryService {
    /// Create a new CategoryService.
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self {
            pool,
            writer: Mutex::new(()),
            name_cache: DashMap::new(),
        })
    }

    /// Insert a category and return its id.
    pub async fn insert(&self, input: CreateCategory) -> AppResult<i64> {
        let _writer = self.writer.lock().await;

        let mut tx = self.pool.begin().await?;
        let id = Category::insert(&mut tx, &input).await?;
        tx.commit().await?;

        info!(id, name = %input.name, mode = %input.mode, target = ?input.target, "category created");
        Ok(id)
    }

    /// All categories in pre-order with depths.
    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let mut conn = self.pool.acquire().await?;
        Category::list(&mut conn).await
    }

    pub async fn suggest(&self, prefix: &str) -> AppResult<Vec<Suggestion>> {
        let mut conn = self.pool.acquire().await?;
        Category::suggest(&mut conn, prefix).await
    }

    /// Get a category's name, with caching.
    pub async fn name(&self, id: i64) -> AppResult<String> {
        if let Some(name) = self.name_cache.get(&id) {
            return Ok(name.clone());
        }

        let _writer = self.writer.lock().await;
        let mut conn = self.pool.acquire().await?;
        let name = Category::name(&mut conn, id).await?;
        self.name_cache.insert(id, name.clone());
        Ok(name)
    }

    pub async fn path(&self, id: i64) -> AppResult<Vec<PathEntry>> {
        let mut conn = self.pool.acquire().await?;
        Category::path(&mut conn, id).await
    }

    /// Rename or re-comment a category.
    pub async fn update(&self, id: i64, input: UpdateCategory) -> AppResult<()> {
        let _writer = self.writer.lock().await;

        let mut tx = self.pool.begin().await?;
        Category::update(&mut tx, id, input).await?;
        tx.commit().await?;

        self.name_cache.remove(&id);
        info!(id, "category updated");
        Ok(())
    }

    /// Amounts rolled up the tree for transactions matching `filter`.
    pub async fn totals(&self, filter: &TransactionFilter) -> AppResult<Vec<CategoryTotal>> {
        let mut conn = self.pool.acquire().await?;
        Category::totals(&mut conn, &filter.without_category().condition()).await
    }

    /// Check the stored tree, logging the first violation found.
    pub async fn verify_integrity(&self) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        let result = Category::verify_integrity(&mut conn).await;
        if let Err(ref e) = result {
            warn!(error = %e, "category tree failed integrity check");
        }
        result
    }
}
