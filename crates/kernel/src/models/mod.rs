//! Database models.

pub mod category;
pub mod dataset;
pub mod dataset_source;
pub mod nested_set;
pub mod setting;
pub mod tag;
pub mod transaction;
pub mod transaction_part;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::query::{Column, Condition, Select, Table, require_one};

pub use category::{
    Category, CategoryTotal, CreateCategory, PathEntry, Suggestion, UpdateCategory,
};
pub use dataset::{CreateDataset, Dataset};
pub use dataset_source::{CreateDatasetSource, DatasetSource};
pub use nested_set::{InsertMode, Interval};
pub use setting::Setting;
pub use tag::{CreateTag, Tag};
pub use transaction::{CreateTransaction, Transaction, TransactionFilter, UpdateTransaction};
pub use transaction_part::{CreateTransactionPart, TransactionPart, UpdateTransactionPart};

/// A category as referenced from a transaction or part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Single-column `COUNT(*) AS count` result.
#[derive(Debug, Deserialize)]
pub(crate) struct Count {
    pub count: i64,
}

/// Not-found unless `table` has a row with this id.
pub(crate) async fn require_exists(
    conn: &mut SqliteConnection,
    table: Table,
    id: i64,
) -> AppResult<()> {
    let rows = Select::from(table)
        .column(Column::new("id"))
        .filter(Condition::new("id = ?").bind(id))
        .fetch_all(conn)
        .await?;
    require_one(rows).map(|_| ())
}

/// SQLite stores booleans as 0/1 integers.
pub(crate) fn bool_from_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(i64::deserialize(deserializer)? != 0)
}
