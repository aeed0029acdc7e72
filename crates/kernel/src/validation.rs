//! Field rules for request bodies and query strings.
//!
//! Structural checks (types, required fields) happen during deserialization;
//! these cover the value ranges serde cannot express.

use crate::error::{AppError, AppResult};
use crate::models::{InsertMode, TransactionFilter};

/// Length bounds on a text field, counted in characters.
pub fn require_len(field: &str, value: &str, min: usize, max: Option<usize>) -> AppResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(AppError::bad_request(format!("The {field} is too short.")));
    }
    if max.is_some_and(|max| len > max) {
        return Err(AppError::bad_request(format!("The {field} is too long.")));
    }
    Ok(())
}

/// Lower bound on an integer field.
pub fn require_min(field: &str, value: i64, min: i64) -> AppResult<()> {
    if value < min {
        return Err(AppError::bad_request(format!("The {field} is too small.")));
    }
    Ok(())
}

/// Optional-field variant of [`require_min`].
pub fn require_min_opt(field: &str, value: Option<i64>, min: i64) -> AppResult<()> {
    value.map_or(Ok(()), |v| require_min(field, v, min))
}

/// Ids in a transaction filter must be non-negative.
pub fn check_filter(filter: &TransactionFilter) -> AppResult<()> {
    require_min_opt("dataset", filter.dataset, 0)?;
    require_min_opt("category", filter.category, 0)
}

/// Parse an insertion mode.
pub fn parse_mode(value: &str) -> AppResult<InsertMode> {
    value.parse()
}
