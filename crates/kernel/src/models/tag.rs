//! Free-form tags.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::Suggestion;
use crate::error::AppResult;
use crate::query::{Column, Condition, Insert, Select, Table, like_prefix};

const TAG: Table = Table::new("tag");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    pub name: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
struct NameRow {
    name: String,
}

impl Tag {
    pub async fn list(conn: &mut SqliteConnection) -> AppResult<Vec<Tag>> {
        Select::from(TAG)
            .columns([
                Column::new("id"),
                Column::new("name"),
                Column::new("comment"),
            ])
            .order_by("name, id")
            .fetch_all_as(conn)
            .await
    }

    pub async fn suggest(conn: &mut SqliteConnection, prefix: &str) -> AppResult<Vec<Suggestion>> {
        Select::from(TAG)
            .columns([Column::new("id"), Column::named("name", "label")])
            .filter(Condition::new("name LIKE ? ESCAPE '\\'").bind(like_prefix(prefix)))
            .order_by("name, id")
            .limit(50)
            .fetch_all_as(conn)
            .await
    }

    pub async fn name(conn: &mut SqliteConnection, id: i64) -> AppResult<String> {
        let row: NameRow = Select::from(TAG)
            .column(Column::new("name"))
            .filter(Condition::new("id = ?").bind(id))
            .fetch_one_as(conn)
            .await?;
        Ok(row.name)
    }

    pub async fn create(conn: &mut SqliteConnection, input: &CreateTag) -> AppResult<i64> {
        Insert::new(TAG)
            .value("name", input.name.as_str())
            .value("comment", input.comment.as_str())
            .execute(conn)
            .await
    }
}
