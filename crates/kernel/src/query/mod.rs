//! Query composition layer.
//!
//! Statements are described with small value objects ([`Select`], [`Patch`],
//! [`Condition`], ...) whose SQL text is fixed at compile time, rendered to
//! parameterized SQL, and run against SQLite returning ordered row maps.

mod builder;
mod executor;
mod types;

pub use builder::{Delete, Insert, Patch, Rendered, Select, Shift};
pub use executor::{Record, require_changed, require_one};
pub use types::{
    Column, Condition, FieldUpdate, Join, JoinKind, QueryError, Table, Value, like_prefix,
};
