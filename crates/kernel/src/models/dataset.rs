//! Datasets: batches of transactions imported from one source.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::require_exists;
use crate::error::AppResult;
use crate::query::{Column, Condition, Insert, Join, Select, Table};

const DATASET: Table = Table::new("dataset");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub source_id: i64,
    pub source_name: Option<String>,
    pub comment: String,
    /// Unix timestamp when created.
    pub created: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDataset {
    #[serde(default)]
    pub comment: String,
}

impl Dataset {
    /// Datasets matching `condition`, oldest first.
    pub async fn list(conn: &mut SqliteConnection, condition: Condition) -> AppResult<Vec<Dataset>> {
        Select::from(DATASET)
            .columns([
                Column::named("dataset.id", "id"),
                Column::named("dataset.source", "source_id"),
                Column::named("dataset_source.name", "source_name"),
                Column::named("dataset.comment", "comment"),
                Column::named("dataset.created", "created"),
            ])
            .join(Join::left(
                Table::new("dataset_source"),
                "dataset_source.id = dataset.source",
            ))
            .filter(condition)
            .order_by("dataset.id")
            .fetch_all_as(conn)
            .await
    }

    pub async fn list_all(conn: &mut SqliteConnection) -> AppResult<Vec<Dataset>> {
        Self::list(conn, Condition::always()).await
    }

    /// Zero or one dataset, as a list.
    pub async fn find(conn: &mut SqliteConnection, id: i64) -> AppResult<Vec<Dataset>> {
        Self::list(conn, Condition::new("dataset.id = ?").bind(id)).await
    }

    /// Create an empty dataset under `source`.
    pub async fn create(
        conn: &mut SqliteConnection,
        source: i64,
        input: &CreateDataset,
    ) -> AppResult<i64> {
        require_exists(conn, Table::new("dataset_source"), source).await?;

        Insert::new(DATASET)
            .value("source", source)
            .value("comment", input.comment.as_str())
            .value("created", chrono::Utc::now().timestamp())
            .execute(conn)
            .await
    }
}
