//! Dataset sources, e.g. one bank account.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::query::{Column, Insert, Select, Table};

const DATASET_SOURCE: Table = Table::new("dataset_source");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub id: i64,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDatasetSource {
    pub name: String,
    #[serde(default)]
    pub comment: String,
}

impl DatasetSource {
    pub async fn list(conn: &mut SqliteConnection) -> AppResult<Vec<DatasetSource>> {
        Select::from(DATASET_SOURCE)
            .columns([
                Column::new("id"),
                Column::new("name"),
                Column::new("comment"),
            ])
            .order_by("id")
            .fetch_all_as(conn)
            .await
    }

    pub async fn create(conn: &mut SqliteConnection, input: &CreateDatasetSource) -> AppResult<i64> {
        Insert::new(DATASET_SOURCE)
            .value("name", input.name.as_str())
            .value("comment", input.comment.as_str())
            .execute(conn)
            .await
    }
}
