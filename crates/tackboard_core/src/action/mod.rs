//! The command engine: every board mutation is one validated, auditable
//! action.
//!
//! # Responsibility
//! - Define the closed set of board commands and their shared contract:
//!   `validate` is read-only and side-effect-free; `apply` re-validates,
//!   mutates, and must run inside one transaction with the audit write.
//! - Define the caller-facing error taxonomy.
//!
//! # Invariants
//! - An action is never applied without validation.
//! - Any failure leaves the store untouched; partial renumbering is
//!   impossible because apply runs inside a single transaction.

use crate::db::DbError;
use crate::model::column::{Column, ColumnId};
use crate::model::entry::{Entry, EntryId};
use crate::model::identity::Identity;
use crate::model::swimlane::{Swimlane, SwimlaneId};
use crate::repo::identity_repo::IdentityError;
use crate::repo::RepoError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod column;
pub mod entry;
pub(crate) mod ordering;
pub mod swimlane;

/// One discrete board command.
///
/// Variants carry the caller-supplied parameters only; entity identities
/// created during apply are reported through [`ActionOutcome`] and the
/// audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Insert an untitled queue column at `insertion_index`.
    AddColumn { insertion_index: i64 },
    /// Soft-remove a column; its board index keeps a gap by design.
    RemoveColumn { column_id: ColumnId },
    /// Reposition a column with two-phase renumbering.
    MoveColumn { column_id: ColumnId, new_index: i64 },
    /// Set one column field from its string form.
    ModifyColumn {
        column_id: ColumnId,
        field: String,
        value: String,
    },
    AddSwimlane { title: String, wip_limit: i64 },
    RemoveSwimlane { swimlane_id: SwimlaneId },
    ModifySwimlane {
        swimlane_id: SwimlaneId,
        field: String,
        value: String,
    },
    /// Insert a note into the outline. `insertion_index == -1` appends.
    AddEntry {
        parent_id: Option<EntryId>,
        insertion_index: i64,
        text: String,
    },
    /// Cascading soft delete of an entry and all of its descendants.
    RemoveEntry { entry_id: EntryId },
    /// Set one entry field (`text` or `status`) from its string form.
    ModifyEntry {
        entry_id: EntryId,
        field: String,
        value: String,
    },
    /// Place or reposition an entry in a board cell.
    MoveEntryOnBoard {
        entry_id: EntryId,
        column_id: ColumnId,
        swimlane_id: SwimlaneId,
        board_index: i64,
        subcolumn_index: i64,
    },
    /// Reposition an entry in the outline. `insertion_index == -1` appends.
    MoveEntryOnOutline {
        entry_id: EntryId,
        new_parent_id: Option<EntryId>,
        insertion_index: i64,
    },
}

/// The entity an applied action returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Column(Column),
    Swimlane(Swimlane),
    Entry(Entry),
}

impl Action {
    /// Stable discriminator used for audit rows and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddColumn { .. } => "add_column",
            Self::RemoveColumn { .. } => "remove_column",
            Self::MoveColumn { .. } => "move_column",
            Self::ModifyColumn { .. } => "modify_column",
            Self::AddSwimlane { .. } => "add_swimlane",
            Self::RemoveSwimlane { .. } => "remove_swimlane",
            Self::ModifySwimlane { .. } => "modify_swimlane",
            Self::AddEntry { .. } => "add_entry",
            Self::RemoveEntry { .. } => "remove_entry",
            Self::ModifyEntry { .. } => "modify_entry",
            Self::MoveEntryOnBoard { .. } => "move_entry_on_board",
            Self::MoveEntryOnOutline { .. } => "move_entry_on_outline",
        }
    }

    /// Checks this action against current store state without mutating it.
    ///
    /// Idempotent; safe to call repeatedly, e.g. to grey out UI controls.
    pub fn validate(&self, conn: &Connection) -> Result<(), ActionError> {
        match self {
            Self::AddColumn { insertion_index } => {
                column::validate_add_column(conn, *insertion_index)
            }
            Self::RemoveColumn { column_id } => column::validate_remove_column(conn, *column_id),
            Self::MoveColumn {
                column_id,
                new_index,
            } => column::validate_move_column(conn, *column_id, *new_index),
            Self::ModifyColumn {
                column_id,
                field,
                value,
            } => column::validate_modify_column(conn, *column_id, field, value).map(|_| ()),
            Self::AddSwimlane { title, wip_limit } => {
                swimlane::validate_add_swimlane(conn, title, *wip_limit)
            }
            Self::RemoveSwimlane { swimlane_id } => {
                swimlane::validate_remove_swimlane(conn, *swimlane_id)
            }
            Self::ModifySwimlane {
                swimlane_id,
                field,
                value,
            } => swimlane::validate_modify_swimlane(conn, *swimlane_id, field, value).map(|_| ()),
            Self::AddEntry {
                parent_id,
                insertion_index,
                ..
            } => entry::validate_add_entry(conn, *parent_id, *insertion_index),
            Self::RemoveEntry { entry_id } => entry::validate_remove_entry(conn, *entry_id),
            Self::ModifyEntry {
                entry_id,
                field,
                value,
            } => entry::validate_modify_entry(conn, *entry_id, field, value).map(|_| ()),
            Self::MoveEntryOnBoard {
                entry_id,
                column_id,
                swimlane_id,
                board_index,
                subcolumn_index,
            } => entry::validate_move_entry_on_board(
                conn,
                *entry_id,
                *column_id,
                *swimlane_id,
                *board_index,
                *subcolumn_index,
            ),
            Self::MoveEntryOnOutline {
                entry_id,
                new_parent_id,
                insertion_index,
            } => entry::validate_move_entry_on_outline(
                conn,
                *entry_id,
                *new_parent_id,
                *insertion_index,
            ),
        }
    }

    /// Validates and then mutates on the given connection.
    ///
    /// The caller owns the surrounding transaction and the audit write; see
    /// `BoardService::apply`.
    pub(crate) fn apply_on(
        &self,
        conn: &Connection,
        actor: &Identity,
        now_ms: i64,
    ) -> Result<ActionOutcome, ActionError> {
        self.validate(conn)?;
        match self {
            Self::AddColumn { insertion_index } => {
                column::apply_add_column(conn, *insertion_index).map(ActionOutcome::Column)
            }
            Self::RemoveColumn { column_id } => {
                column::apply_remove_column(conn, *column_id).map(ActionOutcome::Column)
            }
            Self::MoveColumn {
                column_id,
                new_index,
            } => column::apply_move_column(conn, *column_id, *new_index).map(ActionOutcome::Column),
            Self::ModifyColumn {
                column_id,
                field,
                value,
            } => {
                column::apply_modify_column(conn, *column_id, field, value)
                    .map(ActionOutcome::Column)
            }
            Self::AddSwimlane { title, wip_limit } => {
                swimlane::apply_add_swimlane(conn, title, *wip_limit).map(ActionOutcome::Swimlane)
            }
            Self::RemoveSwimlane { swimlane_id } => {
                swimlane::apply_remove_swimlane(conn, *swimlane_id).map(ActionOutcome::Swimlane)
            }
            Self::ModifySwimlane {
                swimlane_id,
                field,
                value,
            } => swimlane::apply_modify_swimlane(conn, *swimlane_id, field, value)
                .map(ActionOutcome::Swimlane),
            Self::AddEntry {
                parent_id,
                insertion_index,
                text,
            } => entry::apply_add_entry(conn, *parent_id, *insertion_index, text, actor, now_ms)
                .map(ActionOutcome::Entry),
            Self::RemoveEntry { entry_id } => {
                entry::apply_remove_entry(conn, *entry_id, actor, now_ms).map(ActionOutcome::Entry)
            }
            Self::ModifyEntry {
                entry_id,
                field,
                value,
            } => entry::apply_modify_entry(conn, *entry_id, field, value, actor, now_ms)
                .map(ActionOutcome::Entry),
            Self::MoveEntryOnBoard {
                entry_id,
                column_id,
                swimlane_id,
                board_index,
                subcolumn_index,
            } => entry::apply_move_entry_on_board(
                conn,
                *entry_id,
                *column_id,
                *swimlane_id,
                *board_index,
                *subcolumn_index,
                actor,
                now_ms,
            )
            .map(ActionOutcome::Entry),
            Self::MoveEntryOnOutline {
                entry_id,
                new_parent_id,
                insertion_index,
            } => entry::apply_move_entry_on_outline(
                conn,
                *entry_id,
                *new_parent_id,
                *insertion_index,
                actor,
                now_ms,
            )
            .map(ActionOutcome::Entry),
        }
    }
}

/// Entity ids to stamp onto the audit row: parameters first, then the
/// outcome entity fills the slot its kind owns.
pub(crate) fn audit_ids(
    action: &Action,
    outcome: &ActionOutcome,
) -> (Option<ColumnId>, Option<SwimlaneId>, Option<EntryId>) {
    let mut ids = match action {
        Action::AddColumn { .. } | Action::AddSwimlane { .. } | Action::AddEntry { .. } => {
            (None, None, None)
        }
        Action::RemoveColumn { column_id }
        | Action::MoveColumn { column_id, .. }
        | Action::ModifyColumn { column_id, .. } => (Some(*column_id), None, None),
        Action::RemoveSwimlane { swimlane_id } | Action::ModifySwimlane { swimlane_id, .. } => {
            (None, Some(*swimlane_id), None)
        }
        Action::RemoveEntry { entry_id }
        | Action::ModifyEntry { entry_id, .. }
        | Action::MoveEntryOnOutline { entry_id, .. } => (None, None, Some(*entry_id)),
        Action::MoveEntryOnBoard {
            entry_id,
            column_id,
            swimlane_id,
            ..
        } => (Some(*column_id), Some(*swimlane_id), Some(*entry_id)),
    };
    match outcome {
        ActionOutcome::Column(column) => ids.0 = Some(column.id),
        ActionOutcome::Swimlane(swimlane) => ids.1 = Some(swimlane.id),
        ActionOutcome::Entry(entry) => ids.2 = Some(entry.id),
    }
    ids
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}

/// Errors surfaced by validation and application of actions.
///
/// NotFound-style variants and infrastructure errors are distinct from
/// Kanban rule violations; see [`ActionError::is_rule_violation`].
#[derive(Debug)]
pub enum ActionError {
    ColumnNotFound(ColumnId),
    SwimlaneNotFound(SwimlaneId),
    EntryNotFound(EntryId),
    /// Removal or move of a column still holding active cards.
    ColumnOccupied {
        column_id: ColumnId,
        active_cards: i64,
    },
    /// Removal of a swimlane still holding active cards.
    SwimlaneOccupied {
        swimlane_id: SwimlaneId,
        active_cards: i64,
    },
    DuplicateColumnTitle(String),
    DuplicateSwimlaneTitle(String),
    BlankTitle,
    /// WIP limit value that is non-numeric or negative.
    InvalidWipLimit(String),
    InvalidColumnType(String),
    InvalidStatusValue(String),
    InvalidBool(String),
    /// `status = removed` must go through the dedicated remove action.
    RemoveViaModify { use_instead: &'static str },
    /// Reactivation would collide with another active title.
    ReactivationTitleClash(String),
    /// Target datetime that is neither blank nor valid ISO-8601.
    InvalidTargetDate(String),
    UnrecognizedField(String),
    InvalidInsertionIndex { index: i64, upper_bound: i64 },
    InvalidBoardIndex { index: i64, upper_bound: i64 },
    /// Outline move that would make an entry its own ancestor.
    OutlineCycle {
        entry_id: EntryId,
        parent_id: EntryId,
    },
    /// Destination column or swimlane is at its WIP limit.
    WipLimitReached { limit: i64, active_cards: i64 },
    Identity(IdentityError),
    Db(DbError),
    InvalidData(String),
}

impl ActionError {
    /// Whether this error is a Kanban rule violation on a live board, as
    /// opposed to a missing entity or an infrastructure failure.
    pub fn is_rule_violation(&self) -> bool {
        !matches!(
            self,
            Self::ColumnNotFound(_)
                | Self::SwimlaneNotFound(_)
                | Self::EntryNotFound(_)
                | Self::Identity(_)
                | Self::Db(_)
                | Self::InvalidData(_)
        )
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::SwimlaneNotFound(id) => write!(f, "swimlane not found: {id}"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::ColumnOccupied {
                column_id,
                active_cards,
            } => write!(
                f,
                "column {column_id} still holds {active_cards} active card(s)"
            ),
            Self::SwimlaneOccupied {
                swimlane_id,
                active_cards,
            } => write!(
                f,
                "swimlane {swimlane_id} still holds {active_cards} active card(s)"
            ),
            Self::DuplicateColumnTitle(title) => {
                write!(f, "another active column is already titled `{title}`")
            }
            Self::DuplicateSwimlaneTitle(title) => {
                write!(f, "another active swimlane is already titled `{title}`")
            }
            Self::BlankTitle => write!(f, "titles may not be blank"),
            Self::InvalidWipLimit(value) => {
                write!(f, "WIP limit must be a non-negative integer, got `{value}`")
            }
            Self::InvalidColumnType(value) => {
                write!(f, "`{value}` is not a valid column type")
            }
            Self::InvalidStatusValue(value) => write!(f, "`{value}` is not a valid status"),
            Self::InvalidBool(value) => {
                write!(f, "`{value}` is not a boolean value")
            }
            Self::RemoveViaModify { use_instead } => {
                write!(f, "use the {use_instead} action instead of setting status")
            }
            Self::ReactivationTitleClash(title) => write!(
                f,
                "cannot reactivate: another active record is titled `{title}`"
            ),
            Self::InvalidTargetDate(value) => write!(
                f,
                "target datetime must be blank or ISO-8601, got `{value}`"
            ),
            Self::UnrecognizedField(field) => {
                write!(f, "`{field}` is not a recognized field name")
            }
            Self::InvalidInsertionIndex { index, upper_bound } => write!(
                f,
                "insertion index {index} outside permitted range (max {upper_bound})"
            ),
            Self::InvalidBoardIndex { index, upper_bound } => write!(
                f,
                "board index {index} outside permitted range (max {upper_bound})"
            ),
            Self::OutlineCycle {
                entry_id,
                parent_id,
            } => write!(
                f,
                "outline move would create a cycle: entry {entry_id} under {parent_id}"
            ),
            Self::WipLimitReached {
                limit,
                active_cards,
            } => write!(
                f,
                "WIP limit {limit} already met with {active_cards} active card(s)"
            ),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ActionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ActionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<IdentityError> for ActionError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<RepoError> for ActionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::Missing { table, id } => {
                Self::InvalidData(format!("expected row missing: {table} id {id}"))
            }
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}
