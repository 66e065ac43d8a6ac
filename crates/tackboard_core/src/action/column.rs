//! Column commands: add, remove, move, modify.
//!
//! # Invariants
//! - A column holding active cards can be neither removed nor moved.
//! - Removal keeps the column's board index; the gap is deliberate.
//! - Moves renumber in two phases, close-then-open, excluding the moving
//!   column from both passes.

use crate::action::{ordering, ActionError};
use crate::model::column::{Column, ColumnId, ColumnType, LaneStatus};
use crate::repo::board_repo::{
    clear_line_of_commitment_except, insert_column, update_column, BoardRepository,
    SqliteBoardRepository,
};
use rusqlite::Connection;

/// Column fields settable through the modify command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnField {
    Title,
    DoneRule,
    ColumnType,
    WipLimit,
    Status,
    LineOfCommitment,
}

impl ColumnField {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "title" => Some(Self::Title),
            "done_rule" => Some(Self::DoneRule),
            "column_type" => Some(Self::ColumnType),
            "wip_limit" => Some(Self::WipLimit),
            "status" => Some(Self::Status),
            "line_of_commitment" => Some(Self::LineOfCommitment),
            _ => None,
        }
    }
}

pub(crate) fn validate_add_column(conn: &Connection, insertion_index: i64) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let count = repo.column_count()?;
    if insertion_index < 0 || insertion_index > count {
        return Err(ActionError::InvalidInsertionIndex {
            index: insertion_index,
            upper_bound: count,
        });
    }
    Ok(())
}

pub(crate) fn apply_add_column(
    conn: &Connection,
    insertion_index: i64,
) -> Result<Column, ActionError> {
    ordering::open_board_gap(conn, insertion_index, None)?;
    Ok(insert_column(conn, insertion_index)?)
}

pub(crate) fn validate_remove_column(
    conn: &Connection,
    column_id: ColumnId,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    repo.column(column_id, true)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;
    let active_cards = repo.column_card_count(column_id, None)?;
    if active_cards > 0 {
        return Err(ActionError::ColumnOccupied {
            column_id,
            active_cards,
        });
    }
    Ok(())
}

pub(crate) fn apply_remove_column(
    conn: &Connection,
    column_id: ColumnId,
) -> Result<Column, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let mut column = repo
        .column(column_id, true)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;
    column.status = LaneStatus::Removed;
    update_column(conn, &column)?;
    Ok(column)
}

pub(crate) fn validate_move_column(
    conn: &Connection,
    column_id: ColumnId,
    new_index: i64,
) -> Result<(), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    repo.column(column_id, true)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;
    let active_cards = repo.column_card_count(column_id, None)?;
    if active_cards > 0 {
        return Err(ActionError::ColumnOccupied {
            column_id,
            active_cards,
        });
    }
    let count = repo.column_count()?;
    if new_index < 0 || new_index >= count {
        return Err(ActionError::InvalidInsertionIndex {
            index: new_index,
            upper_bound: count - 1,
        });
    }
    Ok(())
}

pub(crate) fn apply_move_column(
    conn: &Connection,
    column_id: ColumnId,
    new_index: i64,
) -> Result<Column, ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let mut column = repo
        .column(column_id, true)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;

    // Phase one closes the gap left behind; phase two opens one at the
    // destination. The moving column sits outside both passes.
    ordering::close_board_gap(conn, column.board_index, column.id)?;
    ordering::open_board_gap(conn, new_index, Some(column.id))?;
    column.board_index = new_index;
    update_column(conn, &column)?;
    Ok(column)
}

pub(crate) fn validate_modify_column(
    conn: &Connection,
    column_id: ColumnId,
    field: &str,
    value: &str,
) -> Result<(Column, ColumnField), ActionError> {
    let repo = SqliteBoardRepository::new(conn);
    let column = repo
        .column(column_id, true)?
        .ok_or(ActionError::ColumnNotFound(column_id))?;
    let field =
        ColumnField::parse(field).ok_or_else(|| ActionError::UnrecognizedField(field.to_string()))?;

    match field {
        ColumnField::Title => {
            if value.trim().is_empty() {
                return Err(ActionError::BlankTitle);
            }
            if repo.active_column_title_exists(value, Some(column_id))? {
                return Err(ActionError::DuplicateColumnTitle(value.to_string()));
            }
        }
        ColumnField::DoneRule => {}
        ColumnField::ColumnType => {
            if ColumnType::parse(value).is_none() {
                return Err(ActionError::InvalidColumnType(value.to_string()));
            }
        }
        ColumnField::WipLimit => {
            parse_wip_limit(value)?;
        }
        ColumnField::Status => match LaneStatus::parse(value) {
            // Removal owns the zero-active-cards check; status cannot
            // bypass it.
            Some(LaneStatus::Removed) => {
                return Err(ActionError::RemoveViaModify {
                    use_instead: "remove_column",
                });
            }
            Some(LaneStatus::Active) => {
                if repo.active_column_title_exists(&column.title, Some(column_id))? {
                    return Err(ActionError::ReactivationTitleClash(column.title.clone()));
                }
            }
            None => return Err(ActionError::InvalidStatusValue(value.to_string())),
        },
        ColumnField::LineOfCommitment => {
            parse_bool(value)?;
        }
    }
    Ok((column, field))
}

pub(crate) fn apply_modify_column(
    conn: &Connection,
    column_id: ColumnId,
    field: &str,
    value: &str,
) -> Result<Column, ActionError> {
    let (mut column, field) = validate_modify_column(conn, column_id, field, value)?;
    match field {
        ColumnField::Title => column.title = value.to_string(),
        ColumnField::DoneRule => column.done_rule = value.to_string(),
        ColumnField::ColumnType => {
            column.column_type = ColumnType::parse(value)
                .ok_or_else(|| ActionError::InvalidColumnType(value.to_string()))?;
        }
        ColumnField::WipLimit => column.wip_limit = parse_wip_limit(value)?,
        ColumnField::Status => column.status = LaneStatus::Active,
        ColumnField::LineOfCommitment => {
            column.line_of_commitment = parse_bool(value)?;
            // Single-winner invariant: raising the flag lowers every other
            // column's in the same transaction.
            if column.line_of_commitment {
                clear_line_of_commitment_except(conn, column.id)?;
            }
        }
    }
    update_column(conn, &column)?;
    Ok(column)
}

fn parse_wip_limit(value: &str) -> Result<i64, ActionError> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| ActionError::InvalidWipLimit(value.to_string()))?;
    if parsed < 0 {
        return Err(ActionError::InvalidWipLimit(value.to_string()));
    }
    Ok(parsed)
}

pub(crate) fn parse_bool(value: &str) -> Result<bool, ActionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ActionError::InvalidBool(value.to_string())),
    }
}
