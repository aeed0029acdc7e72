//! Transaction parts: the categorized splits of a transaction.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::{CategoryRef, require_exists};
use crate::error::AppResult;
use crate::query::{
    Column, Condition, FieldUpdate, Insert, Join, Patch, Select, Table, require_changed,
};

const TXN_PART: Table = Table::new("txn_part");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionPart {
    pub id: i64,
    pub comment: String,
    pub amount: i64,
    pub category: Option<CategoryRef>,
}

#[derive(Deserialize)]
struct PartRow {
    id: i64,
    comment: String,
    amount: i64,
    category_id: Option<i64>,
    category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionPart {
    pub amount: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub category: Option<i64>,
}

/// `category: null` uncategorizes the part; omitting it leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransactionPart {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub category: FieldUpdate<i64>,
}

impl TransactionPart {
    pub async fn list(conn: &mut SqliteConnection, txn: i64) -> AppResult<Vec<TransactionPart>> {
        require_exists(conn, Table::new("txn"), txn).await?;

        let rows: Vec<PartRow> = Select::from(TXN_PART)
            .columns([
                Column::named("txn_part.id", "id"),
                Column::named("txn_part.comment", "comment"),
                Column::named("txn_part.amount", "amount"),
                Column::named("category.id", "category_id"),
                Column::named("category.name", "category_name"),
            ])
            .join(Join::left(
                Table::new("category"),
                "txn_part.category = category.id",
            ))
            .filter(Condition::new("txn_part.txn = ?").bind(txn))
            .order_by("txn_part.id")
            .fetch_all_as(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TransactionPart {
                id: row.id,
                comment: row.comment,
                amount: row.amount,
                category: row
                    .category_id
                    .zip(row.category_name)
                    .map(|(id, name)| CategoryRef { id, name }),
            })
            .collect())
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        txn: i64,
        input: &CreateTransactionPart,
    ) -> AppResult<i64> {
        require_exists(conn, Table::new("txn"), txn).await?;
        if let Some(category) = input.category {
            require_exists(conn, Table::new("category"), category).await?;
        }

        Insert::new(TXN_PART)
            .value("txn", txn)
            .value("comment", input.comment.as_str())
            .value("amount", input.amount)
            .value("category", input.category)
            .execute(conn)
            .await
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        input: UpdateTransactionPart,
    ) -> AppResult<()> {
        if let FieldUpdate::Set(category) = input.category {
            require_exists(conn, Table::new("category"), category).await?;
        }

        let changed = Patch::new(TXN_PART, Condition::new("id = ?").bind(id))
            .set("comment", FieldUpdate::from(input.comment))
            .set("amount", FieldUpdate::from(input.amount))
            .set("category", input.category)
            .execute(conn)
            .await?;
        require_changed(changed)
    }
}
