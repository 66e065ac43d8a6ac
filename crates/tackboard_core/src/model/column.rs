//! Column domain model.
//!
//! # Responsibility
//! - Define the board lane record and its enumerated fields.
//!
//! # Invariants
//! - `board_index` values are unique across all columns, active and removed,
//!   and form a dense `0..N-1` range.
//! - At most one column holds `line_of_commitment = true`.
//! - No two active columns share a `title`.
//! - Removed columns keep their `board_index`; removal never renumbers.

use serde::{Deserialize, Serialize};

/// Stable integer identity of a column row.
pub type ColumnId = i64;

/// Workflow role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Holds work waiting to be pulled.
    Queue,
    /// A work step with its own doing/done partition.
    Step,
    /// Splits one item into smaller ones.
    Breakdown,
    /// Gathers finished work.
    Collect,
}

impl ColumnType {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Step => "step",
            Self::Breakdown => "breakdown",
            Self::Collect => "collect",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queue" => Some(Self::Queue),
            "step" => Some(Self::Step),
            "breakdown" => Some(Self::Breakdown),
            "collect" => Some(Self::Collect),
            _ => None,
        }
    }
}

/// Lifecycle state shared by columns and swimlanes.
///
/// Removal is always a soft transition to `Removed`; rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneStatus {
    Active,
    Removed,
}

impl LaneStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Removed => "removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// One board lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Stable row identity.
    pub id: ColumnId,
    /// Dense 0-based position among all columns, order-significant.
    pub board_index: i64,
    /// Unique among active columns. May be blank only on a freshly added column.
    pub title: String,
    /// Free-text exit criteria for cards leaving this column.
    pub done_rule: String,
    pub column_type: ColumnType,
    /// Maximum active cards; 0 means unlimited.
    pub wip_limit: i64,
    /// Board-wide single-winner marker; see the engine's modify rules.
    pub line_of_commitment: bool,
    pub status: LaneStatus,
}

impl Column {
    pub fn is_active(&self) -> bool {
        self.status == LaneStatus::Active
    }
}
