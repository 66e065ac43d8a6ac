//! Entry domain model: outline nodes that may also be board cards.
//!
//! # Responsibility
//! - Define the outline node record and its status lifecycle.
//! - Define the board cell coordinate used for card placement.
//!
//! # Invariants
//! - `branch_id` forms a tree; an entry never reaches itself through parents.
//! - `outline_index` is dense `0..K-1` among non-removed siblings of one parent.
//! - Removal is a cascading soft delete; removed rows keep stale indices.

use crate::model::column::ColumnId;
use crate::model::swimlane::SwimlaneId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable integer identity of an entry row.
pub type EntryId = i64;

/// Lifecycle state of an outline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Pure outline text, not on the board.
    Note,
    /// An active card on the board.
    Card,
    /// A card flagged as blocked by a user.
    Blocked,
    /// A card taken off the board but kept in the outline.
    Discarded,
    /// A card in the final board space.
    Complete,
    /// Deleted from the outline entirely (tombstone).
    Removed,
}

impl EntryStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Card => "card",
            Self::Blocked => "blocked",
            Self::Discarded => "discarded",
            Self::Complete => "complete",
            Self::Removed => "removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "card" => Some(Self::Card),
            "blocked" => Some(Self::Blocked),
            "discarded" => Some(Self::Discarded),
            "complete" => Some(Self::Complete),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    /// Whether an entry with this status counts against WIP limits and
    /// blocks column/swimlane removal.
    pub fn counts_as_active_card(self) -> bool {
        !matches!(self, Self::Discarded | Self::Removed)
    }
}

/// One outline node, optionally placed on the board as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable row identity.
    pub id: EntryId,
    /// Parent entry; `None` means outline root.
    pub branch_id: Option<EntryId>,
    /// Board placement; unset while the entry is a pure note.
    pub column_id: Option<ColumnId>,
    pub swimlane_id: Option<SwimlaneId>,
    /// Dense 0-based position among non-removed siblings.
    pub outline_index: i64,
    /// Position within the entry's board cell; unset off the board.
    pub board_index: Option<i64>,
    /// Sub-partition within a cell, e.g. doing/done inside a step column.
    pub subcolumn_index: i64,
    pub text: String,
    pub status: EntryStatus,
    pub created_by: Uuid,
    pub created_at_ms: i64,
    pub modified_by: Uuid,
    pub modified_at_ms: i64,
}

impl Entry {
    pub fn is_removed(&self) -> bool {
        self.status == EntryStatus::Removed
    }
}

/// Coordinate of one board cell: a column/swimlane intersection plus the
/// optional sub-partition inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardCell {
    pub column_id: ColumnId,
    pub swimlane_id: SwimlaneId,
    pub subcolumn_index: i64,
}
