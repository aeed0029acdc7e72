//! Transaction model: one imported ledger line, split into parts.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::{CategoryRef, bool_from_int, require_exists};
use crate::error::{AppError, AppResult};
use crate::query::{
    Column, Condition, Delete, FieldUpdate, Insert, Join, Patch, Select, Table, require_changed,
};

const TXN: Table = Table::new("txn");

/// A transaction with its parts aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub comment: String,
    pub malformed: bool,
    /// Unix timestamp.
    pub timestamp: i64,
    pub description: String,
    /// Amount as imported, in minor units.
    pub transaction_amount: i64,
    /// Sum of the matching parts; `None` when there are none.
    pub combined_amount: Option<i64>,
    /// Distinct categories of the matching parts, by id.
    pub combined_categories: Vec<CategoryRef>,
}

#[derive(Deserialize)]
struct TransactionRow {
    id: i64,
    comment: String,
    #[serde(deserialize_with = "bool_from_int")]
    malformed: bool,
    timestamp: i64,
    description: String,
    transaction_amount: i64,
    combined_amount: Option<i64>,
    /// JSON array of `{id, name}` objects, one per categorized part.
    combined_categories: String,
}

/// Filters for listing transactions and category totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on the timestamp.
    pub from: Option<i64>,
    /// Inclusive upper bound on the timestamp.
    pub to: Option<i64>,
    pub dataset: Option<i64>,
    pub category: Option<i64>,
    /// Also match parts filed under descendants of `category`.
    #[serde(default)]
    pub subcategories: bool,
}

impl TransactionFilter {
    /// The filter as a condition over `txn` and `txn_part`.
    pub fn condition(&self) -> Condition {
        let mut conditions = Vec::new();
        if let Some(from) = self.from {
            conditions.push(Condition::new("txn.timestamp >= ?").bind(from));
        }
        if let Some(to) = self.to {
            conditions.push(Condition::new("txn.timestamp <= ?").bind(to));
        }
        if let Some(dataset) = self.dataset {
            conditions.push(Condition::new("txn.dataset = ?").bind(dataset));
        }
        match (self.category, self.subcategories) {
            (Some(category), false) => {
                conditions.push(Condition::new("txn_part.category = ?").bind(category));
            }
            (Some(category), true) => conditions.push(
                Condition::new(
                    "txn_part.category IN (\
                     SELECT sub.id FROM category AS sub, category AS root \
                     WHERE root.id = ? \
                     AND root.set_start <= sub.set_start AND sub.set_end <= root.set_end)",
                )
                .bind(category),
            ),
            (None, _) => {}
        }
        Condition::all(conditions)
    }

    /// The filter without its category restriction.
    pub fn without_category(&self) -> Self {
        Self {
            category: None,
            subcategories: false,
            ..self.clone()
        }
    }
}

/// Input for manually adding a transaction to a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub timestamp: i64,
    pub description: String,
    pub amount: i64,
    #[serde(default)]
    pub comment: String,
}

/// Input for editing a transaction. Any edit clears the malformed flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransaction {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

fn parse_categories(raw: &str) -> AppResult<Vec<CategoryRef>> {
    let mut categories: Vec<CategoryRef> = serde_json::from_str(raw)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bad category list {raw:?}: {e}")))?;
    categories.sort_by_key(|c| c.id);
    categories.dedup_by_key(|c| c.id);
    Ok(categories)
}

impl Transaction {
    /// Transactions matching `filter`, newest first.
    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &TransactionFilter,
    ) -> AppResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = Select::from(TXN)
            .columns([
                Column::named("txn.id", "id"),
                Column::named("txn.comment", "comment"),
                Column::named("txn.malformed", "malformed"),
                Column::named("txn.timestamp", "timestamp"),
                Column::named("txn.description", "description"),
                Column::named("txn.amount", "transaction_amount"),
                Column::named("SUM(txn_part.amount)", "combined_amount"),
                Column::named(
                    "json_group_array(json_object('id', category.id, 'name', category.name)) \
                     FILTER (WHERE category.id IS NOT NULL)",
                    "combined_categories",
                ),
            ])
            .join(Join::left(Table::new("txn_part"), "txn_part.txn = txn.id"))
            .join(Join::left(
                Table::new("category"),
                "txn_part.category = category.id",
            ))
            .filter(filter.condition())
            .group_by("txn.id")
            .order_by("txn.timestamp DESC, txn.id DESC")
            .fetch_all_as(conn)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Transaction {
                    id: row.id,
                    comment: row.comment,
                    malformed: row.malformed,
                    timestamp: row.timestamp,
                    description: row.description,
                    transaction_amount: row.transaction_amount,
                    combined_amount: row.combined_amount,
                    combined_categories: parse_categories(&row.combined_categories)?,
                })
            })
            .collect()
    }

    /// Add a transaction to a dataset with a single uncategorized part
    /// covering the whole amount.
    pub async fn create(
        conn: &mut SqliteConnection,
        dataset: i64,
        input: &CreateTransaction,
    ) -> AppResult<i64> {
        require_exists(conn, Table::new("dataset"), dataset).await?;

        let id = Insert::new(TXN)
            .value("dataset", dataset)
            .value("raw", "")
            .value("comment", input.comment.as_str())
            .value("malformed", false)
            .value("timestamp", input.timestamp)
            .value("description", input.description.as_str())
            .value("amount", input.amount)
            .execute(conn)
            .await?;

        Insert::new(Table::new("txn_part"))
            .value("txn", id)
            .value("comment", "")
            .value("amount", input.amount)
            .value("category", None::<i64>)
            .execute(conn)
            .await?;

        Ok(id)
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        input: UpdateTransaction,
    ) -> AppResult<()> {
        let changed = Patch::new(TXN, Condition::new("id = ?").bind(id))
            .set("malformed", FieldUpdate::Set(false))
            .set("comment", FieldUpdate::from(input.comment))
            .set("timestamp", FieldUpdate::from(input.timestamp))
            .set("description", FieldUpdate::from(input.description))
            .set("amount", FieldUpdate::from(input.amount))
            .execute(conn)
            .await?;
        require_changed(changed)
    }

    /// Delete a transaction and, by cascade, its parts.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<()> {
        let deleted = Delete::new(TXN, Condition::new("id = ?").bind(id))
            .execute(conn)
            .await?;
        require_changed(deleted)
    }
}
