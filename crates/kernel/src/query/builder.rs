//! Statement descriptions and their SQL rendering.
//!
//! Rendering is pure: each builder produces a [`Rendered`] statement whose
//! parameter list is in placeholder order. Execution lives in `executor.rs`.

use std::collections::HashSet;

use super::types::{Column, Condition, FieldUpdate, Join, QueryError, Table, Value};

/// SQL text plus parameters in `?` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Rendered {
    /// Refuse statements whose placeholders and parameters disagree.
    fn checked(sql: String, params: Vec<Value>) -> Result<Self, QueryError> {
        let placeholders = sql.matches('?').count();
        if placeholders != params.len() {
            return Err(QueryError::ParameterMismatch {
                placeholders,
                params: params.len(),
            });
        }
        Ok(Self { sql, params })
    }
}

/// A SELECT over one or more tables.
///
/// The first table is the primary FROM target; further tables are
/// comma-joined in order, then explicit joins follow in order.
#[derive(Debug, Clone)]
pub struct Select {
    tables: Vec<Table>,
    columns: Vec<Column>,
    joins: Vec<Join>,
    condition: Condition,
    group_by: Option<&'static str>,
    order_by: Option<&'static str>,
    limit: Option<u32>,
}

impl Select {
    pub fn from(table: Table) -> Self {
        Self {
            tables: vec![table],
            columns: Vec::new(),
            joins: Vec::new(),
            condition: Condition::always(),
            group_by: None,
            order_by: None,
            limit: None,
        }
    }

    /// Add another table to the FROM list.
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Set the WHERE condition. Combine filters beforehand with [`Condition::and`].
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn group_by(mut self, expr: &'static str) -> Self {
        self.group_by = Some(expr);
        self
    }

    pub fn order_by(mut self, expr: &'static str) -> Self {
        self.order_by = Some(expr);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Output keys in projection order.
    pub fn output_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::output_name).collect()
    }

    pub fn render(&self) -> Result<Rendered, QueryError> {
        if self.columns.is_empty() {
            return Err(QueryError::NoColumns);
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.output_name()) {
                return Err(QueryError::DuplicateColumn(column.output_name()));
            }
        }

        let projection = self
            .columns
            .iter()
            .map(|c| format!("({})", c.expr()))
            .collect::<Vec<_>>()
            .join(", ");
        let from = self
            .tables
            .iter()
            .map(Table::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {projection} FROM {from}");
        for join in &self.joins {
            sql.push_str(&format!(
                " {} JOIN {} AS {} ON ({})",
                join.kind.as_sql(),
                join.table.name(),
                join.table.alias(),
                join.on
            ));
        }
        sql.push_str(&format!(" WHERE {}", self.condition.fragment()));
        if let Some(group_by) = self.group_by {
            sql.push_str(&format!(" GROUP BY {group_by}"));
        }
        if let Some(order_by) = self.order_by {
            sql.push_str(&format!(" ORDER BY {order_by}"));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Rendered::checked(sql, self.condition.params().to_vec())
    }
}

/// A partial UPDATE: only supplied columns are written.
#[derive(Debug, Clone)]
pub struct Patch {
    table: Table,
    values: Vec<(&'static str, Value)>,
    condition: Condition,
}

impl Patch {
    pub fn new(table: Table, condition: Condition) -> Self {
        Self {
            table,
            values: Vec::new(),
            condition,
        }
    }

    /// Record the intent for one column; `Unset` leaves it out of the statement.
    pub fn set<V: Into<Value>>(mut self, column: &'static str, update: FieldUpdate<V>) -> Self {
        if let Some(value) = update.into_value() {
            self.values.push((column, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn render(&self) -> Result<Rendered, QueryError> {
        if self.values.is_empty() {
            return Err(QueryError::EmptyPatch);
        }

        let assignments = self
            .values
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {}",
            self.table.name(),
            self.condition.fragment()
        );

        let mut params: Vec<Value> = self.values.iter().map(|(_, v)| v.clone()).collect();
        params.extend(self.condition.params().iter().cloned());
        Rendered::checked(sql, params)
    }
}

/// `UPDATE t SET c = c + delta WHERE ...`, the widen primitive.
#[derive(Debug, Clone)]
pub struct Shift {
    table: Table,
    column: &'static str,
    delta: i64,
    condition: Condition,
}

impl Shift {
    pub fn new(table: Table, column: &'static str, delta: i64, condition: Condition) -> Self {
        Self {
            table,
            column,
            delta,
            condition,
        }
    }

    pub fn render(&self) -> Result<Rendered, QueryError> {
        let sql = format!(
            "UPDATE {table} SET {column} = {column} + ? WHERE {cond}",
            table = self.table.name(),
            column = self.column,
            cond = self.condition.fragment()
        );
        let mut params = vec![Value::Integer(self.delta)];
        params.extend(self.condition.params().iter().cloned());
        Rendered::checked(sql, params)
    }
}

/// A single-row INSERT.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Table,
    values: Vec<(&'static str, Value)>,
}

impl Insert {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    pub fn render(&self) -> Result<Rendered, QueryError> {
        if self.values.is_empty() {
            return Err(QueryError::EmptyInsert);
        }
        let columns = self
            .values
            .iter()
            .map(|(column, _)| *column)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; self.values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            self.table.name()
        );
        Rendered::checked(sql, self.values.iter().map(|(_, v)| v.clone()).collect())
    }
}

/// A filtered DELETE.
#[derive(Debug, Clone)]
pub struct Delete {
    table: Table,
    condition: Condition,
}

impl Delete {
    pub fn new(table: Table, condition: Condition) -> Self {
        Self { table, condition }
    }

    pub fn render(&self) -> Result<Rendered, QueryError> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table.name(),
            self.condition.fragment()
        );
        Rendered::checked(sql, self.condition.params().to_vec())
    }
}
