//! Entry commands: outline insertion and moves, board placement, cascading
//! removal, field edits.
//!
//! # Invariants
//! - `insertion_index == -1` appends after the last live sibling.
//! - Removal cascades to the whole subtree and leaves outline indices of
//!   removed rows untouched.
//! - An outline move may never place an entry under its own descendant.
//! - Board placement promotes a `note` to a `card` and enforces column and
//!   swimlane WIP limits.

use crate::action::{ordering, ActionError};
use crate::model::column::ColumnId;
use crate::model::entry::{BoardCell, Entry, EntryId, EntryStatus};
use crate::model::identity::Identity;
use crate::model::swimlane::SwimlaneId;
use crate::repo::board_repo::{
    insert_entry, mark_subtree_removed, update_entry, BoardRepository, SqliteBoardRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

/// Entry fields settable through the modify command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryField {
    Text,
    Status,
}

impl EntryField {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

pub(crate) fn validate_add_entry(
    conn: &Connection,
    parent_id: Option<EntryId>,
    insertion_index: i64,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    if let Some(parent_id) = parent_id {
        repo.entry(parent_id, false)?
            .ok_or(ActionError::EntryNotFound(parent_id))?;
    }
    let count = repo.outline_sibling_count(parent_id, None)?;
    if insertion_index < -1 || insertion_index > count {
        return Err(ActionError::InvalidInsertionIndex {
            index: insertion_index,
            upper_bound: count,
        });
    }
    Ok(())
}

pub(crate) fn apply_add_entry(
    conn: &Connection,
    parent_id: Option<EntryId>,
    insertion_index: i64,
    text: &str,
    actor: &Identity,
    now_ms: i64,
) -> Result<Entry, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let count = repo.outline_sibling_count(parent_id, None)?;
    let at = if insertion_index == -1 {
        count
    } else {
        insertion_index
    };
    ordering::open_outline_gap(conn, parent_id, at, None)?;
    Ok(insert_entry(conn, parent_id, at, text, actor, now_ms)?)
}

pub(crate) fn validate_remove_entry(
    conn: &Connection,
    entry_id: EntryId,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    repo.entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;
    Ok(())
}

pub(crate) fn apply_remove_entry(
    conn: &Connection,
    entry_id: EntryId,
    actor: &Identity,
    now_ms: i64,
) -> Result<Entry, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    mark_subtree_removed(conn, entry_id, actor, now_ms)?;
    repo.entry(entry_id, true)?
        .ok_or(ActionError::EntryNotFound(entry_id))
}

pub(crate) fn validate_modify_entry(
    conn: &Connection,
    entry_id: EntryId,
    field: &str,
    value: &str,
) -> Result<(Entry, EntryField), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let entry = repo
        .entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;
    let field =
        EntryField::parse(field).ok_or_else(|| ActionError::UnrecognizedField(field.to_string()))?;

    if field == EntryField::Status {
        match EntryStatus::parse(value) {
            Some(EntryStatus::Removed) => {
                return Err(ActionError::RemoveViaModify {
                    use_instead: "remove_entry",
                });
            }
            Some(_) => {}
            None => return Err(ActionError::InvalidStatusValue(value.to_string())),
        }
    }
    Ok((entry, field))
}

pub(crate) fn apply_modify_entry(
    conn: &Connection,
    entry_id: EntryId,
    field: &str,
    value: &str,
    actor: &Identity,
    now_ms: i64,
) -> Result<Entry, ActionError> {
    let (mut entry, field) = validate_modify_entry(conn, entry_id, field, value)?;
    match field {
        EntryField::Text => entry.text = value.to_string(),
        EntryField::Status => {
            entry.status = EntryStatus::parse(value)
                .ok_or_else(|| ActionError::InvalidStatusValue(value.to_string()))?;
        }
    }
    entry.modified_by = actor.uid;
    entry.modified_at_ms = now_ms;
    update_entry(conn, &entry)?;
    Ok(entry)
}

pub(crate) fn validate_move_entry_on_board(
    conn: &Connection,
    entry_id: EntryId,
    column_id: ColumnId,
    swimlane_id: SwimlaneId,
    board_index: i64,
    subcolumn_index: i64,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let entry = repo
        .entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;
    let column = repo
        .column(column_id, false)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;
    let swimlane = repo
        .swimlane(swimlane_id, false)?
        .ok_or(ActionError::SwimlaneNotFound(swimlane_id))?;

    let cell = BoardCell {
        column_id,
        swimlane_id,
        subcolumn_index,
    };
    let cell_count = repo.cell_card_count(&cell, Some(entry.id))?;
    if board_index < 0 || board_index > cell_count {
        return Err(ActionError::InvalidBoardIndex {
            index: board_index,
            upper_bound: cell_count,
        });
    }

    // WIP limits count the destination lane without the moving card, so a
    // move inside one column never trips that column's own limit.
    if column.wip_limit > 0 {
        let active_cards = repo.column_card_count(column_id, Some(entry.id))?;
        if active_cards >= column.wip_limit {
            return Err(ActionError::WipLimitReached {
                limit: column.wip_limit,
                active_cards,
            });
        }
    }
    if swimlane.wip_limit > 0 {
        let active_cards = repo.swimlane_card_count(swimlane_id, Some(entry.id))?;
        if active_cards >= swimlane.wip_limit {
            return Err(ActionError::WipLimitReached {
                limit: swimlane.wip_limit,
                active_cards,
            });
        }
    }
    Ok(())
}

pub(crate) fn apply_move_entry_on_board(
    conn: &Connection,
    entry_id: EntryId,
    column_id: ColumnId,
    swimlane_id: SwimlaneId,
    board_index: i64,
    subcolumn_index: i64,
    actor: &Identity,
    now_ms: i64,
) -> Result<Entry, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let mut entry = repo
        .entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;

    if let (Some(old_column), Some(old_swimlane), Some(old_index)) =
        (entry.column_id, entry.swimlane_id, entry.board_index)
    {
        let old_cell = BoardCell {
            column_id: old_column,
            swimlane_id: old_swimlane,
            subcolumn_index: entry.subcolumn_index,
        };
        ordering::close_cell_gap(conn, &old_cell, old_index, entry.id)?;
    }

    let cell = BoardCell {
        column_id,
        swimlane_id,
        subcolumn_index,
    };
    ordering::open_cell_gap(conn, &cell, board_index, Some(entry.id))?;

    entry.column_id = Some(column_id);
    entry.swimlane_id = Some(swimlane_id);
    entry.board_index = Some(board_index);
    entry.subcolumn_index = subcolumn_index;
    if entry.status == EntryStatus::Note {
        entry.status = EntryStatus::Card;
    }
    entry.modified_by = actor.uid;
    entry.modified_at_ms = now_ms;
    update_entry(conn, &entry)?;
    Ok(entry)
}

pub(crate) fn validate_move_entry_on_outline(
    conn: &Connection,
    entry_id: EntryId,
    new_parent_id: Option<EntryId>,
    insertion_index: i64,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    repo.entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;

    if let Some(parent_id) = new_parent_id {
        if parent_id == entry_id {
            return Err(ActionError::OutlineCycle {
                entry_id,
                parent_id,
            });
        }
        repo.entry(parent_id, false)?
            .ok_or(ActionError::EntryNotFound(parent_id))?;
        if would_create_cycle(&repo, entry_id, parent_id)? {
            return Err(ActionError::OutlineCycle {
                entry_id,
                parent_id,
            });
        }
    }

    let count = repo.outline_sibling_count(new_parent_id, Some(entry_id))?;
    if insertion_index < -1 || insertion_index > count {
        return Err(ActionError::InvalidInsertionIndex {
            index: insertion_index,
            upper_bound: count,
        });
    }
    Ok(())
}

pub(crate) fn apply_move_entry_on_outline(
    conn: &Connection,
    entry_id: EntryId,
    new_parent_id: Option<EntryId>,
    insertion_index: i64,
    actor: &Identity,
    now_ms: i64,
) -> Result<Entry, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let mut entry = repo
        .entry(entry_id, false)?
        .ok_or(ActionError::EntryNotFound(entry_id))?;

    ordering::close_outline_gap(conn, entry.branch_id, entry.outline_index, entry.id)?;

    let count = repo.outline_sibling_count(new_parent_id, Some(entry.id))?;
    let at = if insertion_index == -1 {
        count
    } else {
        insertion_index
    };
    ordering::open_outline_gap(conn, new_parent_id, at, Some(entry.id))?;

    entry.branch_id = new_parent_id;
    entry.outline_index = at;
    entry.modified_by = actor.uid;
    entry.modified_at_ms = now_ms;
    update_entry(conn, &entry)?;
    Ok(entry)
}

/// Walks ancestors from `parent_id` toward the root; a hit on `entry_id`
/// means the move would fold the entry under its own subtree.
fn would_create_cycle(
    repo: &SqliteBoardRepository<'_>,
    entry_id: EntryId,
    parent_id: EntryId,
) -> Result<bool, ActionError> {
    let mut seen = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if id == entry_id {
            return Ok(true);
        }
        if !seen.insert(id) {
            // Pre-existing cycle in stored data; the move cannot make it
            // worse, but refuse anyway.
            return Ok(true);
        }
        current = repo
            .entry(id, true)?
            .ok_or(ActionError::EntryNotFound(id))?
            .branch_id;
    }
    Ok(false)
}
