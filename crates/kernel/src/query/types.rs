//! Value objects for the query composition layer.
//!
//! Every piece of SQL text accepted here is `&'static str`, so it can only
//! come from the program itself. Values supplied by a request travel as
//! [`Value`] parameters and are bound, never spliced into the text.

use std::fmt;
use std::ops::BitAnd;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

/// SQLite has no boolean storage class; booleans are stored as 0/1.
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A relation in a FROM or JOIN clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    name: &'static str,
    alias: Option<&'static str>,
}

impl Table {
    /// Reference a relation under its own name.
    pub const fn new(name: &'static str) -> Self {
        Self { name, alias: None }
    }

    /// Reference a relation under an alias (needed for self-joins).
    pub const fn aliased(name: &'static str, alias: &'static str) -> Self {
        Self {
            name,
            alias: Some(alias),
        }
    }

    /// Physical relation name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name the relation is visible under; defaults to the relation name.
    pub fn alias(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.name),
            None => f.write_str(self.name),
        }
    }
}

/// A projected expression and the key it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    expr: &'static str,
    name: Option<&'static str>,
}

impl Column {
    /// Project an expression under its own text.
    pub const fn new(expr: &'static str) -> Self {
        Self { expr, name: None }
    }

    /// Project an expression under an explicit output name.
    pub const fn named(expr: &'static str, name: &'static str) -> Self {
        Self {
            expr,
            name: Some(name),
        }
    }

    pub fn expr(&self) -> &'static str {
        self.expr
    }

    /// Output key; defaults to the expression text.
    pub fn output_name(&self) -> &'static str {
        self.name.unwrap_or(self.expr)
    }
}

/// Join kinds supported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

/// A join against another relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Table,
    pub on: &'static str,
}

impl Join {
    pub const fn inner(table: Table, on: &'static str) -> Self {
        Self {
            kind: JoinKind::Inner,
            table,
            on,
        }
    }

    pub const fn left(table: Table, on: &'static str) -> Self {
        Self {
            kind: JoinKind::Left,
            table,
            on,
        }
    }

    pub const fn right(table: Table, on: &'static str) -> Self {
        Self {
            kind: JoinKind::Right,
            table,
            on,
        }
    }
}

/// An immutable filter: a SQL fragment plus its positional parameters.
///
/// Conjunction produces a new condition `(left) AND (right)` whose
/// parameters are the left parameters followed by the right ones, so the
/// `?` placeholders keep lining up with their values. Operands are never
/// modified, which makes it safe to reuse one condition in several queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    fragment: String,
    params: Vec<Value>,
}

impl Condition {
    /// A condition from a fixed fragment. Attach values with [`Condition::bind`].
    pub fn new(fragment: &'static str) -> Self {
        Self {
            fragment: fragment.to_string(),
            params: Vec::new(),
        }
    }

    /// The unconditional-true filter.
    pub fn always() -> Self {
        Self::new("TRUE")
    }

    /// Bind the value for the next `?` in the fragment.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// `expr IN (?, ?, ...)` with one bound parameter per element.
    ///
    /// An empty list matches nothing.
    pub fn in_list<V: Into<Value>>(
        expr: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let params: Vec<Value> = values.into_iter().map(Into::into).collect();
        if params.is_empty() {
            return Self::new("FALSE");
        }
        let placeholders = vec!["?"; params.len()].join(", ");
        Self {
            fragment: format!("{expr} IN ({placeholders})"),
            params,
        }
    }

    /// Conjunction of two conditions, leaving both untouched.
    pub fn and(&self, other: &Condition) -> Condition {
        let mut params = Vec::with_capacity(self.params.len() + other.params.len());
        params.extend(self.params.iter().cloned());
        params.extend(other.params.iter().cloned());
        Condition {
            fragment: format!("({}) AND ({})", self.fragment, other.fragment),
            params,
        }
    }

    /// Conjunction of every condition in order; [`Condition::always`] when empty.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Condition {
        conditions
            .into_iter()
            .reduce(|acc, next| acc.and(&next))
            .unwrap_or_else(Condition::always)
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Parameter for `expr LIKE ? ESCAPE '\'` matching values that start with `prefix`.
///
/// The prefix's own `%`, `_` and `\` are escaped so they match literally.
pub fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        self.and(&rhs)
    }
}

/// Per-field intent of a partial update.
///
/// Deserializes as: field missing → `Unset`, `null` → `Null`, anything
/// else → `Set`. Fields must carry `#[serde(default)]` for the missing case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the column unchanged.
    Unset,
    /// Store the value.
    Set(T),
    /// Store SQL NULL.
    Null,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unset
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldUpdate::Unset)
    }

    /// The value to store, or `None` when the column is left alone.
    pub fn into_value(self) -> Option<Value>
    where
        T: Into<Value>,
    {
        match self {
            FieldUpdate::Unset => None,
            FieldUpdate::Set(value) => Some(value.into()),
            FieldUpdate::Null => Some(Value::Null),
        }
    }
}

/// `None` means "not supplied", for columns that cannot be nulled.
impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldUpdate::Unset, FieldUpdate::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Null,
        })
    }
}

/// Errors raised while describing or rendering a statement.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("select has no columns")]
    NoColumns,

    #[error("duplicate output column `{0}`")]
    DuplicateColumn(&'static str),

    #[error("statement has {placeholders} placeholders but {params} bound parameters")]
    ParameterMismatch { placeholders: usize, params: usize },

    #[error("No fields to update.")]
    EmptyPatch,

    #[error("insert has no values")]
    EmptyInsert,

    #[error("unsupported column type `{0}`")]
    UnsupportedType(String),
}
