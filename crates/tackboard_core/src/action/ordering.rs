//! Dense index renumbering shared by insert, remove, and move commands.
//!
//! # Responsibility
//! - Open and close single-slot gaps in the three ordering scopes: the
//!   column sequence, one outline sibling group, and one board cell.
//!
//! # Invariants
//! - Every helper excludes a designated moving row so two-phase moves never
//!   double-shift it.
//! - Column renumbering spans active and removed columns alike; outline and
//!   cell renumbering only touch rows whose status keeps them in the group.
//! - Soft-removed rows are never renumbered; their stale indices are kept
//!   for history.

use crate::model::column::ColumnId;
use crate::model::entry::{BoardCell, EntryId, EntryStatus};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Shifts `board_index` up by one for every column at or after `at`.
pub(crate) fn open_board_gap(
    conn: &Connection,
    at: i64,
    except: Option<ColumnId>,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE columns
         SET board_index = board_index + 1
         WHERE board_index >= ?1
           AND id != COALESCE(?2, -1);",
        params![at, except],
    )?;
    Ok(())
}

/// Shifts `board_index` down by one for every column strictly above `above`.
pub(crate) fn close_board_gap(conn: &Connection, above: i64, except: ColumnId) -> RepoResult<()> {
    conn.execute(
        "UPDATE columns
         SET board_index = board_index - 1
         WHERE board_index > ?1
           AND id != ?2;",
        params![above, except],
    )?;
    Ok(())
}

/// Shifts `outline_index` up for non-removed siblings of `parent` at or
/// after `at`.
pub(crate) fn open_outline_gap(
    conn: &Connection,
    parent: Option<EntryId>,
    at: i64,
    except: Option<EntryId>,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE entries
         SET outline_index = outline_index + 1
         WHERE branch_id IS ?1
           AND status != ?2
           AND outline_index >= ?3
           AND id != COALESCE(?4, -1);",
        params![parent, EntryStatus::Removed.as_db(), at, except],
    )?;
    Ok(())
}

/// Shifts `outline_index` down for non-removed siblings of `parent`
/// strictly above `above`.
pub(crate) fn close_outline_gap(
    conn: &Connection,
    parent: Option<EntryId>,
    above: i64,
    except: EntryId,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE entries
         SET outline_index = outline_index - 1
         WHERE branch_id IS ?1
           AND status != ?2
           AND outline_index > ?3
           AND id != ?4;",
        params![parent, EntryStatus::Removed.as_db(), above, except],
    )?;
    Ok(())
}

/// Shifts `board_index` up for active cards of one cell at or after `at`.
pub(crate) fn open_cell_gap(
    conn: &Connection,
    cell: &BoardCell,
    at: i64,
    except: Option<EntryId>,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE entries
         SET board_index = board_index + 1
         WHERE column_id = ?1
           AND swimlane_id = ?2
           AND subcolumn_index = ?3
           AND status NOT IN (?4, ?5)
           AND board_index >= ?6
           AND id != COALESCE(?7, -1);",
        params![
            cell.column_id,
            cell.swimlane_id,
            cell.subcolumn_index,
            EntryStatus::Discarded.as_db(),
            EntryStatus::Removed.as_db(),
            at,
            except
        ],
    )?;
    Ok(())
}

/// Shifts `board_index` down for active cards of one cell strictly above
/// `above`.
pub(crate) fn close_cell_gap(
    conn: &Connection,
    cell: &BoardCell,
    above: i64,
    except: EntryId,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE entries
         SET board_index = board_index - 1
         WHERE column_id = ?1
           AND swimlane_id = ?2
           AND subcolumn_index = ?3
           AND status NOT IN (?4, ?5)
           AND board_index > ?6
           AND id != ?7;",
        params![
            cell.column_id,
            cell.swimlane_id,
            cell.subcolumn_index,
            EntryStatus::Discarded.as_db(),
            EntryStatus::Removed.as_db(),
            above,
            except
        ],
    )?;
    Ok(())
}
