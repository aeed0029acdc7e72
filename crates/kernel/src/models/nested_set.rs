//! Nested-set interval arithmetic for the category tree.
//!
//! Each node owns an interval `[set_start, set_end]`. A node is an ancestor
//! of another exactly when its interval strictly contains the other's, so
//! depth and ancestry are range comparisons instead of tree walks.
//!
//! Insertion picks a threshold `t`, moves every boundary greater than `t`
//! up by two and places the new node at `[t + 1, t + 2]`. Nodes whose
//! interval straddles `t` (the new node's ancestors) grow by two; every
//! other node keeps its width.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A node's closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(rename = "set_start")]
    pub start: i64,
    #[serde(rename = "set_end")]
    pub end: i64,
}

impl Interval {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> i64 {
        self.end - self.start
    }

    /// Containment including equality (a node contains itself).
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Containment excluding equality: `self` is an ancestor of `other`.
    pub fn strictly_contains(&self, other: &Interval) -> bool {
        self.start < other.start && other.end < self.end
    }

    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.end < other.start || other.end < self.start
    }

    /// Whether a widen at `threshold` grows this interval.
    pub fn straddles(&self, threshold: i64) -> bool {
        self.start <= threshold && threshold < self.end
    }

    /// The interval after every boundary greater than `threshold` moved up by two.
    pub fn widened(&self, threshold: i64) -> Interval {
        let shift = |b: i64| if b > threshold { b + 2 } else { b };
        Interval::new(shift(self.start), shift(self.end))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Where a new node goes relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// The tree's single root; only valid on an empty tree.
    Root,
    /// First child of the target.
    First,
    /// Sibling immediately preceding the target.
    Before,
    /// Sibling immediately following the target.
    After,
}

impl FromStr for InsertMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(InsertMode::Root),
            "first" => Ok(InsertMode::First),
            "before" => Ok(InsertMode::Before),
            "after" => Ok(InsertMode::After),
            _ => Err(AppError::bad_request("Invalid mode")),
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InsertMode::Root => "root",
            InsertMode::First => "first",
            InsertMode::Before => "before",
            InsertMode::After => "after",
        })
    }
}

/// The resolved insertion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub interval: Interval,
    /// The target has no ancestors.
    pub is_root: bool,
}

/// The validated outcome of an insertion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Boundaries strictly greater than this move up by two.
    pub shift_greater_than: i64,
}

impl Placement {
    /// Validate the mode against the target and tree state and compute the threshold.
    pub fn plan(mode: InsertMode, target: Option<Target>, tree_empty: bool) -> AppResult<Self> {
        let shift_greater_than = match (mode, target) {
            (InsertMode::Root, Some(_)) => {
                return Err(AppError::bad_request("A root cannot have a target."));
            }
            (InsertMode::Root, None) if !tree_empty => {
                return Err(AppError::bad_request("Root already exists."));
            }
            (InsertMode::Root, None) => -1,
            (_, None) => return Err(AppError::bad_request("Target is missing.")),
            (InsertMode::Before | InsertMode::After, Some(t)) if t.is_root => {
                return Err(AppError::bad_request("The root cannot have siblings."));
            }
            (InsertMode::First, Some(t)) => t.interval.start,
            (InsertMode::Before, Some(t)) => t.interval.start - 1,
            (InsertMode::After, Some(t)) => t.interval.end,
        };
        Ok(Self { shift_greater_than })
    }

    /// The new node's interval.
    pub fn interval(&self) -> Interval {
        Interval::new(self.shift_greater_than + 1, self.shift_greater_than + 2)
    }
}

/// Check a full set of intervals for structural consistency.
///
/// Returns a description of the first violation found.
pub fn verify(nodes: &[(i64, Interval)]) -> Result<(), String> {
    let mut boundaries = HashSet::with_capacity(nodes.len() * 2);
    for (id, interval) in nodes {
        if interval.start >= interval.end {
            return Err(format!("category {id} has an empty interval {interval}"));
        }
        for boundary in [interval.start, interval.end] {
            if !boundaries.insert(boundary) {
                return Err(format!("category {id} reuses boundary {boundary}"));
            }
        }
    }

    for (i, (a_id, a)) in nodes.iter().enumerate() {
        for (b_id, b) in &nodes[i + 1..] {
            if !(a.is_disjoint(b) || a.strictly_contains(b) || b.strictly_contains(a)) {
                return Err(format!(
                    "categories {a_id} {a} and {b_id} {b} partially overlap"
                ));
            }
        }
    }

    let roots: Vec<i64> = nodes
        .iter()
        .filter(|(_, n)| !nodes.iter().any(|(_, other)| other.strictly_contains(n)))
        .map(|(id, _)| *id)
        .collect();
    if roots.len() > 1 {
        return Err(format!("multiple root categories: {roots:?}"));
    }

    Ok(())
}
