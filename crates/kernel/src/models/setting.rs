//! Key/value settings. Only `name` (the ledger's display name) exists.

use serde::Deserialize;
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::query::{Column, Condition, FieldUpdate, Patch, Select, Table, require_changed};

const SETTING: Table = Table::new("setting");

pub struct Setting;

#[derive(Deserialize)]
struct ValueRow {
    value: String,
}

impl Setting {
    pub async fn get(conn: &mut SqliteConnection, name: &'static str) -> AppResult<String> {
        let row: ValueRow = Select::from(SETTING)
            .column(Column::new("value"))
            .filter(Condition::new("name = ?").bind(name))
            .fetch_one_as(conn)
            .await?;
        Ok(row.value)
    }

    /// Overwrite an existing setting.
    pub async fn set(conn: &mut SqliteConnection, name: &'static str, value: &str) -> AppResult<()> {
        let changed = Patch::new(SETTING, Condition::new("name = ?").bind(name))
            .set("value", FieldUpdate::Set(value))
            .execute(conn)
            .await?;
        require_changed(changed)
    }
}
