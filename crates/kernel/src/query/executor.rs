//! Running rendered statements against SQLite.
//!
//! Every operation takes the connection explicitly; callers pass
//! `&mut *tx` for work inside a request transaction or a pooled
//! connection for plain reads.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, TypeInfo, ValueRef};

use super::builder::{Delete, Insert, Patch, Rendered, Select, Shift};
use super::types::{QueryError, Value};
use crate::error::{AppError, AppResult};

/// One result row: projection output names mapped to values, in projection order.
pub type Record = serde_json::Map<String, JsonValue>;

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

async fn execute(conn: &mut SqliteConnection, rendered: &Rendered) -> AppResult<u64> {
    tracing::trace!(sql = %rendered.sql, params = rendered.params.len(), "execute");
    let result = bind_params(sqlx::query(&rendered.sql), &rendered.params)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

fn decode_column(row: &SqliteRow, index: usize) -> AppResult<JsonValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" => JsonValue::from(row.try_get::<i64, _>(index)?),
        "REAL" => JsonValue::from(row.try_get::<f64, _>(index)?),
        "TEXT" => JsonValue::from(row.try_get::<String, _>(index)?),
        _ => return Err(QueryError::UnsupportedType(type_name).into()),
    };
    Ok(value)
}

fn decode_row(row: &SqliteRow, names: &[&'static str]) -> AppResult<Record> {
    let mut record = Record::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        record.insert((*name).to_string(), decode_column(row, index)?);
    }
    Ok(record)
}

impl Select {
    /// Run the query, returning one ordered map per row.
    ///
    /// Row order is the store's unless an ORDER BY was given.
    pub async fn fetch_all(&self, conn: &mut SqliteConnection) -> AppResult<Vec<Record>> {
        let rendered = self.render()?;
        let names = self.output_names();
        tracing::trace!(sql = %rendered.sql, params = rendered.params.len(), "select");

        let rows = bind_params(sqlx::query(&rendered.sql), &rendered.params)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(|row| decode_row(row, &names)).collect()
    }

    /// Run the query and deserialize every row into `T`.
    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        conn: &mut SqliteConnection,
    ) -> AppResult<Vec<T>> {
        self.fetch_all(conn)
            .await?
            .into_iter()
            .map(|record| {
                serde_json::from_value(JsonValue::Object(record))
                    .map_err(|e| AppError::Internal(e.into()))
            })
            .collect()
    }

    /// Run the query expecting exactly one row.
    pub async fn fetch_one_as<T: DeserializeOwned>(
        &self,
        conn: &mut SqliteConnection,
    ) -> AppResult<T> {
        require_one(self.fetch_all_as(conn).await?)
    }
}

impl Patch {
    /// Apply the patch, returning the number of rows changed.
    pub async fn execute(&self, conn: &mut SqliteConnection) -> AppResult<u64> {
        execute(conn, &self.render()?).await
    }
}

impl Shift {
    pub async fn execute(&self, conn: &mut SqliteConnection) -> AppResult<u64> {
        execute(conn, &self.render()?).await
    }
}

impl Delete {
    pub async fn execute(&self, conn: &mut SqliteConnection) -> AppResult<u64> {
        execute(conn, &self.render()?).await
    }
}

impl Insert {
    /// Insert the row and return its store-assigned id.
    pub async fn execute(&self, conn: &mut SqliteConnection) -> AppResult<i64> {
        let rendered = self.render()?;
        tracing::trace!(sql = %rendered.sql, "insert");
        let result = bind_params(sqlx::query(&rendered.sql), &rendered.params)
            .execute(&mut *conn)
            .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Exactly one row, or not-found when there is none.
///
/// More than one row means the caller's key was not unique, which is a bug.
pub fn require_one<T>(rows: Vec<T>) -> AppResult<T> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        (None, _) => Err(AppError::NotFound),
        (Some(_), n) => Err(AppError::Internal(anyhow::anyhow!(
            "expected at most one row, got {n}"
        ))),
    }
}

/// Not-found unless the statement changed at least one row.
pub fn require_changed(rows_affected: u64) -> AppResult<()> {
    if rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db;
    use crate::query::{Column, Condition, FieldUpdate, Table};

    #[test]
    fn require_one_cases() {
        assert_eq!(require_one(vec![7]).unwrap(), 7);
        assert!(matches!(require_one(Vec::<i32>::new()), Err(AppError::NotFound)));
        assert!(matches!(require_one(vec![1, 2]), Err(AppError::Internal(_))));
    }

    #[test]
    fn require_changed_cases() {
        assert!(require_changed(1).is_ok());
        assert!(matches!(require_changed(0), Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn records_keep_projection_order_and_types() {
        let pool = db::memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        Insert::new(Table::new("tag"))
            .value("name", "coffee")
            .value("comment", "")
            .execute(&mut conn)
            .await
            .unwrap();

        let rows = Select::from(Table::new("tag"))
            .columns([
                Column::new("name"),
                Column::named("id", "tag_id"),
                Column::named("NULL", "nothing"),
                Column::named("1.5", "ratio"),
            ])
            .filter(Condition::new("name = ?").bind("coffee"))
            .fetch_all(&mut conn)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "tag_id", "nothing", "ratio"]);
        assert_eq!(rows[0]["name"], "coffee");
        assert_eq!(rows[0]["tag_id"], 1);
        assert!(rows[0]["nothing"].is_null());
        assert_eq!(rows[0]["ratio"], 1.5);
    }

    #[tokio::test]
    async fn patch_reports_changed_rows() {
        let pool = db::memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let id = Insert::new(Table::new("tag"))
            .value("name", "fuel")
            .value("comment", "")
            .execute(&mut conn)
            .await
            .unwrap();

        let changed = Patch::new(Table::new("tag"), Condition::new("id = ?").bind(id))
            .set("comment", FieldUpdate::Set("car"))
            .execute(&mut conn)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let missing = Patch::new(Table::new("tag"), Condition::new("id = ?").bind(id + 100))
            .set("comment", FieldUpdate::Set("car"))
            .execute(&mut conn)
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }
}
