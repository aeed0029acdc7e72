//! Category model: a single-rooted tree stored as nested-set intervals.
//!
//! Structural writes (`insert`) must run inside one transaction and be
//! serialized with each other; `CategoryService` provides both. Reads may
//! run on any connection.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::Count;
use super::nested_set::{self, InsertMode, Interval, Placement, Target};
use crate::error::{AppError, AppResult};
use crate::query::{
    Column, Condition, FieldUpdate, Insert, Join, Patch, Select, Shift, Table, like_prefix,
    require_changed,
};

const CATEGORY: Table = Table::new("category");
const NODE: Table = Table::aliased("category", "node");
const PARENT: Table = Table::aliased("category", "parent");

/// `parent` is `node` itself or one of its ancestors.
const NODE_WITHIN_PARENT: &str =
    "parent.set_start <= node.set_start AND node.set_end <= parent.set_end";

const SUGGESTION_LIMIT: u32 = 50;

/// A category with its depth below the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub comment: String,
    /// Number of ancestors; the root has depth 0.
    pub depth: i64,
}

/// A prefix-match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
    pub label: String,
}

/// One step of a category's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub id: i64,
    pub name: String,
    pub depth: i64,
}

/// Amount rolled up over a category and all of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub id: i64,
    pub name: String,
    pub depth: i64,
    pub total: i64,
    /// Distinct transactions contributing to `total`.
    pub transactions: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub target: Option<i64>,
    pub mode: InsertMode,
}

/// Input for renaming or re-commenting a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
struct TargetRow {
    set_start: i64,
    set_end: i64,
    depth: i64,
}

#[derive(Deserialize)]
struct IntervalRow {
    id: i64,
    set_start: i64,
    set_end: i64,
}

#[derive(Deserialize)]
struct NameRow {
    name: String,
}

impl Category {
    /// Insert a category relative to `input.target` and return its id.
    pub async fn insert(conn: &mut SqliteConnection, input: &CreateCategory) -> AppResult<i64> {
        let target = match input.target {
            Some(id) => Some(Self::target(conn, id).await?),
            None => None,
        };
        let tree_empty = match input.mode {
            InsertMode::Root => Self::count(conn).await? == 0,
            _ => false,
        };
        let placement = Placement::plan(input.mode, target, tree_empty)?;
        let threshold = placement.shift_greater_than;

        Shift::new(
            CATEGORY,
            "set_start",
            2,
            Condition::new("set_start > ?").bind(threshold),
        )
        .execute(conn)
        .await?;
        Shift::new(
            CATEGORY,
            "set_end",
            2,
            Condition::new("set_end > ?").bind(threshold),
        )
        .execute(conn)
        .await?;

        let interval = placement.interval();
        let id = Insert::new(CATEGORY)
            .value("name", input.name.as_str())
            .value("comment", "")
            .value("set_start", interval.start)
            .value("set_end", interval.end)
            .execute(conn)
            .await?;

        Self::assert_no_collision(conn, id, interval).await?;

        tracing::debug!(id, mode = %input.mode, %interval, "category placed");
        Ok(id)
    }

    /// Resolve a target's interval and whether it is the root.
    async fn target(conn: &mut SqliteConnection, id: i64) -> AppResult<Target> {
        let row: TargetRow = Select::from(NODE)
            .table(PARENT)
            .columns([
                Column::named("node.set_start", "set_start"),
                Column::named("node.set_end", "set_end"),
                Column::named("COUNT(parent.id) - 1", "depth"),
            ])
            .filter(Condition::new("node.id = ?").bind(id) & Condition::new(NODE_WITHIN_PARENT))
            .group_by("node.id")
            .fetch_one_as(conn)
            .await?;

        Ok(Target {
            interval: Interval::new(row.set_start, row.set_end),
            is_root: row.depth == 0,
        })
    }

    async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
        let row: Count = Select::from(CATEGORY)
            .column(Column::named("COUNT(*)", "count"))
            .fetch_one_as(conn)
            .await?;
        Ok(row.count)
    }

    async fn assert_no_collision(
        conn: &mut SqliteConnection,
        id: i64,
        interval: Interval,
    ) -> AppResult<()> {
        let clashes = Select::from(CATEGORY)
            .column(Column::new("id"))
            .filter(
                Condition::new("id <> ?").bind(id)
                    & Condition::new("set_start IN (?, ?) OR set_end IN (?, ?)")
                        .bind(interval.start)
                        .bind(interval.end)
                        .bind(interval.start)
                        .bind(interval.end),
            )
            .limit(1)
            .fetch_all(conn)
            .await?;

        if !clashes.is_empty() {
            return Err(AppError::Invariant(format!(
                "category {id} at {interval} shares a boundary with an existing category"
            )));
        }
        Ok(())
    }

    /// Every category in pre-order with its depth.
    pub async fn list(conn: &mut SqliteConnection) -> AppResult<Vec<Category>> {
        Select::from(NODE)
            .table(PARENT)
            .columns([
                Column::named("node.id", "id"),
                Column::named("node.name", "name"),
                Column::named("node.comment", "comment"),
                Column::named("COUNT(parent.id) - 1", "depth"),
            ])
            .filter(Condition::new(NODE_WITHIN_PARENT))
            .group_by("node.id")
            .order_by("node.set_start")
            .fetch_all_as(conn)
            .await
    }

    /// Categories whose name starts with `prefix`, ordered by name.
    pub async fn suggest(conn: &mut SqliteConnection, prefix: &str) -> AppResult<Vec<Suggestion>> {
        Select::from(CATEGORY)
            .columns([Column::new("id"), Column::named("name", "label")])
            .filter(Condition::new("name LIKE ? ESCAPE '\\'").bind(like_prefix(prefix)))
            .order_by("name, id")
            .limit(SUGGESTION_LIMIT)
            .fetch_all_as(conn)
            .await
    }

    pub async fn name(conn: &mut SqliteConnection, id: i64) -> AppResult<String> {
        let row: NameRow = Select::from(CATEGORY)
            .column(Column::new("name"))
            .filter(Condition::new("id = ?").bind(id))
            .fetch_one_as(conn)
            .await?;
        Ok(row.name)
    }

    /// The chain from the root down to and including `id`.
    pub async fn path(conn: &mut SqliteConnection, id: i64) -> AppResult<Vec<PathEntry>> {
        let rows: Vec<Suggestion> = Select::from(NODE)
            .table(PARENT)
            .columns([
                Column::named("parent.id", "id"),
                Column::named("parent.name", "label"),
            ])
            .filter(Condition::new("node.id = ?").bind(id) & Condition::new(NODE_WITHIN_PARENT))
            .order_by("parent.set_start")
            .fetch_all_as(conn)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound);
        }

        Ok(rows
            .into_iter()
            .zip(0..)
            .map(|(row, depth)| PathEntry {
                id: row.id,
                name: row.label,
                depth,
            })
            .collect())
    }

    /// Update name and/or comment. Structure is untouched.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        input: UpdateCategory,
    ) -> AppResult<()> {
        let changed = Patch::new(CATEGORY, Condition::new("id = ?").bind(id))
            .set("name", FieldUpdate::from(input.name))
            .set("comment", FieldUpdate::from(input.comment))
            .execute(conn)
            .await?;
        require_changed(changed)
    }

    /// Amounts of transaction parts rolled up the tree.
    ///
    /// `filter` restricts the contributing transactions (it may reference
    /// `txn` and `txn_part`). Categories without contributions are omitted.
    pub async fn totals(
        conn: &mut SqliteConnection,
        filter: &Condition,
    ) -> AppResult<Vec<CategoryTotal>> {
        Select::from(NODE)
            .table(PARENT)
            .columns([
                Column::named("parent.id", "id"),
                Column::named("parent.name", "name"),
                Column::named(
                    "SELECT COUNT(*) FROM category AS anc \
                     WHERE anc.set_start < parent.set_start AND parent.set_end < anc.set_end",
                    "depth",
                ),
                Column::named("SUM(txn_part.amount)", "total"),
                Column::named("COUNT(DISTINCT txn_part.txn)", "transactions"),
            ])
            .join(Join::inner(
                Table::new("txn_part"),
                "txn_part.category = node.id",
            ))
            .join(Join::inner(Table::new("txn"), "txn.id = txn_part.txn"))
            .filter(Condition::new(NODE_WITHIN_PARENT).and(filter))
            .group_by("parent.id")
            .order_by("parent.set_start")
            .fetch_all_as(conn)
            .await
    }

    /// Every category's interval.
    pub async fn intervals(conn: &mut SqliteConnection) -> AppResult<Vec<(i64, Interval)>> {
        let rows: Vec<IntervalRow> = Select::from(CATEGORY)
            .columns([
                Column::new("id"),
                Column::new("set_start"),
                Column::new("set_end"),
            ])
            .order_by("set_start")
            .fetch_all_as(conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.id, Interval::new(r.set_start, r.set_end)))
            .collect())
    }

    /// Check the stored tree for overlaps, shared boundaries and extra roots.
    pub async fn verify_integrity(conn: &mut SqliteConnection) -> AppResult<()> {
        let intervals = Self::intervals(conn).await?;
        nested_set::verify(&intervals).map_err(AppError::Invariant)
    }
}
