//! Board repository: reads and row mutations for columns, swimlanes, entries.
//!
//! # Responsibility
//! - Provide the query surface consumed by the GUI layer and by command
//!   validation.
//! - Provide row-level insert/update helpers for the command engine.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - "Active card" always means `status NOT IN ('discarded', 'removed')`.
//! - No physical deletes; lifecycle changes are status flips.

use crate::model::column::{Column, ColumnId, ColumnType, LaneStatus};
use crate::model::entry::{BoardCell, Entry, EntryId, EntryStatus};
use crate::model::identity::Identity;
use crate::model::swimlane::{Swimlane, SwimlaneId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;
use uuid::Uuid;

const COLUMN_SELECT_SQL: &str = "SELECT
    id,
    board_index,
    title,
    done_rule,
    column_type,
    wip_limit,
    line_of_commitment,
    status
FROM columns";

const SWIMLANE_SELECT_SQL: &str = "SELECT
    id,
    title,
    wip_limit,
    status,
    target_start,
    target_end
FROM swimlanes";

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    branch_id,
    column_id,
    swimlane_id,
    outline_index,
    board_index,
    subcolumn_index,
    text,
    status,
    created_by,
    created_at_ms,
    modified_by,
    modified_at_ms
FROM entries";

/// Canonical text shape for persisted target dates.
const TARGET_DATE_DB_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Query surface over the board store.
pub trait BoardRepository {
    fn column(&self, id: ColumnId, include_removed: bool) -> RepoResult<Option<Column>>;
    /// Active columns ordered by `board_index`.
    fn active_columns(&self) -> RepoResult<Vec<Column>>;
    /// Every column, removed ones included, ordered by `board_index`.
    fn all_columns(&self) -> RepoResult<Vec<Column>>;
    fn column_count(&self) -> RepoResult<i64>;
    fn active_column_title_exists(
        &self,
        title: &str,
        exclude: Option<ColumnId>,
    ) -> RepoResult<bool>;
    /// Count of non-discarded, non-removed cards on a column.
    fn column_card_count(&self, id: ColumnId, exclude: Option<EntryId>) -> RepoResult<i64>;

    fn swimlane(&self, id: SwimlaneId, include_removed: bool) -> RepoResult<Option<Swimlane>>;
    fn active_swimlanes(&self) -> RepoResult<Vec<Swimlane>>;
    fn active_swimlane_title_exists(
        &self,
        title: &str,
        exclude: Option<SwimlaneId>,
    ) -> RepoResult<bool>;
    fn swimlane_card_count(&self, id: SwimlaneId, exclude: Option<EntryId>) -> RepoResult<i64>;

    fn entry(&self, id: EntryId, include_removed: bool) -> RepoResult<Option<Entry>>;
    /// Non-removed children of one parent ordered by `outline_index`.
    fn outline_children(&self, parent: Option<EntryId>) -> RepoResult<Vec<Entry>>;
    fn outline_sibling_count(
        &self,
        parent: Option<EntryId>,
        exclude: Option<EntryId>,
    ) -> RepoResult<i64>;
    /// Cards in one board cell ordered by `board_index`.
    fn cell_cards(&self, cell: &BoardCell) -> RepoResult<Vec<Entry>>;
    fn cell_card_count(&self, cell: &BoardCell, exclude: Option<EntryId>) -> RepoResult<i64>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn column(&self, id: ColumnId, include_removed: bool) -> RepoResult<Option<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR status != 'removed');"
        ))?;
        let mut rows = stmt.query(params![id, include_removed as i64])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    fn active_columns(&self) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE status = 'active'
             ORDER BY board_index ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn all_columns(&self) -> RepoResult<Vec<Column>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COLUMN_SELECT_SQL} ORDER BY board_index ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn column_count(&self) -> RepoResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM columns;", [], |row| row.get(0))?;
        Ok(count)
    }

    fn active_column_title_exists(
        &self,
        title: &str,
        exclude: Option<ColumnId>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM columns
                WHERE status = 'active'
                  AND title = ?1
                  AND id != COALESCE(?2, -1)
            );",
            params![title, exclude],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn column_card_count(&self, id: ColumnId, exclude: Option<EntryId>) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM entries
             WHERE column_id = ?1
               AND status NOT IN (?2, ?3)
               AND id != COALESCE(?4, -1);",
            params![
                id,
                EntryStatus::Discarded.as_db(),
                EntryStatus::Removed.as_db(),
                exclude
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn swimlane(&self, id: SwimlaneId, include_removed: bool) -> RepoResult<Option<Swimlane>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SWIMLANE_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR status != 'removed');"
        ))?;
        let mut rows = stmt.query(params![id, include_removed as i64])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_swimlane_row(row)?));
        }
        Ok(None)
    }

    fn active_swimlanes(&self) -> RepoResult<Vec<Swimlane>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SWIMLANE_SELECT_SQL}
             WHERE status = 'active'
             ORDER BY title ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut swimlanes = Vec::new();
        while let Some(row) = rows.next()? {
            swimlanes.push(parse_swimlane_row(row)?);
        }
        Ok(swimlanes)
    }

    fn active_swimlane_title_exists(
        &self,
        title: &str,
        exclude: Option<SwimlaneId>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM swimlanes
                WHERE status = 'active'
                  AND title = ?1
                  AND id != COALESCE(?2, -1)
            );",
            params![title, exclude],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn swimlane_card_count(&self, id: SwimlaneId, exclude: Option<EntryId>) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM entries
             WHERE swimlane_id = ?1
               AND status NOT IN (?2, ?3)
               AND id != COALESCE(?4, -1);",
            params![
                id,
                EntryStatus::Discarded.as_db(),
                EntryStatus::Removed.as_db(),
                exclude
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn entry(&self, id: EntryId, include_removed: bool) -> RepoResult<Option<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR status != 'removed');"
        ))?;
        let mut rows = stmt.query(params![id, include_removed as i64])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn outline_children(&self, parent: Option<EntryId>) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE branch_id IS ?1
               AND status != 'removed'
             ORDER BY outline_index ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![parent])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn outline_sibling_count(
        &self,
        parent: Option<EntryId>,
        exclude: Option<EntryId>,
    ) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM entries
             WHERE branch_id IS ?1
               AND status != 'removed'
               AND id != COALESCE(?2, -1);",
            params![parent, exclude],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn cell_cards(&self, cell: &BoardCell) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE column_id = ?1
               AND swimlane_id = ?2
               AND subcolumn_index = ?3
               AND status NOT IN (?4, ?5)
             ORDER BY board_index ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![
            cell.column_id,
            cell.swimlane_id,
            cell.subcolumn_index,
            EntryStatus::Discarded.as_db(),
            EntryStatus::Removed.as_db(),
        ])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn cell_card_count(&self, cell: &BoardCell, exclude: Option<EntryId>) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM entries
             WHERE column_id = ?1
               AND swimlane_id = ?2
               AND subcolumn_index = ?3
               AND status NOT IN (?4, ?5)
               AND id != COALESCE(?6, -1);",
            params![
                cell.column_id,
                cell.swimlane_id,
                cell.subcolumn_index,
                EntryStatus::Discarded.as_db(),
                EntryStatus::Removed.as_db(),
                exclude
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Inserts an untitled queue column at the given board index and returns it.
pub(crate) fn insert_column(conn: &Connection, board_index: i64) -> RepoResult<Column> {
    conn.execute(
        "INSERT INTO columns (board_index) VALUES (?1);",
        params![board_index],
    )?;
    let id = conn.last_insert_rowid();
    SqliteBoardRepository::new(conn)
        .column(id, true)?
        .ok_or(RepoError::Missing {
            table: "columns",
            id,
        })
}

/// Writes every field of an existing column row.
pub(crate) fn update_column(conn: &Connection, column: &Column) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE columns
         SET board_index = ?1,
             title = ?2,
             done_rule = ?3,
             column_type = ?4,
             wip_limit = ?5,
             line_of_commitment = ?6,
             status = ?7
         WHERE id = ?8;",
        params![
            column.board_index,
            column.title,
            column.done_rule,
            column.column_type.as_db(),
            column.wip_limit,
            column.line_of_commitment as i64,
            column.status.as_db(),
            column.id,
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::Missing {
            table: "columns",
            id: column.id,
        });
    }
    Ok(())
}

/// Clears the line-of-commitment flag on every column except one.
pub(crate) fn clear_line_of_commitment_except(
    conn: &Connection,
    keep: ColumnId,
) -> RepoResult<()> {
    conn.execute(
        "UPDATE columns SET line_of_commitment = 0 WHERE id != ?1;",
        params![keep],
    )?;
    Ok(())
}

pub(crate) fn insert_swimlane(
    conn: &Connection,
    title: &str,
    wip_limit: i64,
) -> RepoResult<Swimlane> {
    conn.execute(
        "INSERT INTO swimlanes (title, wip_limit) VALUES (?1, ?2);",
        params![title, wip_limit],
    )?;
    let id = conn.last_insert_rowid();
    SqliteBoardRepository::new(conn)
        .swimlane(id, true)?
        .ok_or(RepoError::Missing {
            table: "swimlanes",
            id,
        })
}

pub(crate) fn update_swimlane(conn: &Connection, swimlane: &Swimlane) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE swimlanes
         SET title = ?1,
             wip_limit = ?2,
             status = ?3,
             target_start = ?4,
             target_end = ?5
         WHERE id = ?6;",
        params![
            swimlane.title,
            swimlane.wip_limit,
            swimlane.status.as_db(),
            swimlane
                .target_start
                .map(target_date_to_db)
                .transpose()?,
            swimlane.target_end.map(target_date_to_db).transpose()?,
            swimlane.id,
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::Missing {
            table: "swimlanes",
            id: swimlane.id,
        });
    }
    Ok(())
}

/// Inserts a fresh note entry at the given outline position and returns it.
pub(crate) fn insert_entry(
    conn: &Connection,
    branch_id: Option<EntryId>,
    outline_index: i64,
    text: &str,
    author: &Identity,
    now_ms: i64,
) -> RepoResult<Entry> {
    conn.execute(
        "INSERT INTO entries (
            branch_id,
            outline_index,
            text,
            status,
            created_by,
            created_at_ms,
            modified_by,
            modified_at_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6);",
        params![
            branch_id,
            outline_index,
            text,
            EntryStatus::Note.as_db(),
            author.uid.to_string(),
            now_ms,
        ],
    )?;
    let id = conn.last_insert_rowid();
    SqliteBoardRepository::new(conn)
        .entry(id, true)?
        .ok_or(RepoError::Missing {
            table: "entries",
            id,
        })
}

/// Writes every field of an existing entry row.
pub(crate) fn update_entry(conn: &Connection, entry: &Entry) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE entries
         SET branch_id = ?1,
             column_id = ?2,
             swimlane_id = ?3,
             outline_index = ?4,
             board_index = ?5,
             subcolumn_index = ?6,
             text = ?7,
             status = ?8,
             modified_by = ?9,
             modified_at_ms = ?10
         WHERE id = ?11;",
        params![
            entry.branch_id,
            entry.column_id,
            entry.swimlane_id,
            entry.outline_index,
            entry.board_index,
            entry.subcolumn_index,
            entry.text,
            entry.status.as_db(),
            entry.modified_by.to_string(),
            entry.modified_at_ms,
            entry.id,
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::Missing {
            table: "entries",
            id: entry.id,
        });
    }
    Ok(())
}

/// Tombstones one entry and its whole subtree, stamping the acting identity.
///
/// Indices of removed rows are left untouched; gaps among removed siblings
/// are part of the audit design.
pub(crate) fn mark_subtree_removed(
    conn: &Connection,
    root: EntryId,
    actor: &Identity,
    now_ms: i64,
) -> RepoResult<()> {
    conn.execute(
        "WITH RECURSIVE twigs(id) AS (
            SELECT id FROM entries WHERE id = ?1
            UNION ALL
            SELECT child.id
            FROM entries child
            INNER JOIN twigs parent ON child.branch_id = parent.id
        )
        UPDATE entries
        SET status = ?2,
            modified_by = ?3,
            modified_at_ms = ?4
        WHERE id IN (SELECT id FROM twigs)
          AND status != ?2;",
        params![
            root,
            EntryStatus::Removed.as_db(),
            actor.uid.to_string(),
            now_ms
        ],
    )?;
    Ok(())
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let type_text: String = row.get("column_type")?;
    let column_type = ColumnType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid column type `{type_text}` in columns.column_type"
        ))
    })?;
    let status_text: String = row.get("status")?;
    let status = LaneStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in columns.status"))
    })?;

    Ok(Column {
        id: row.get("id")?,
        board_index: row.get("board_index")?,
        title: row.get("title")?,
        done_rule: row.get("done_rule")?,
        column_type,
        wip_limit: row.get("wip_limit")?,
        line_of_commitment: parse_db_bool(
            row.get("line_of_commitment")?,
            "columns.line_of_commitment",
        )?,
        status,
    })
}

fn parse_swimlane_row(row: &Row<'_>) -> RepoResult<Swimlane> {
    let status_text: String = row.get("status")?;
    let status = LaneStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in swimlanes.status"
        ))
    })?;

    Ok(Swimlane {
        id: row.get("id")?,
        title: row.get("title")?,
        wip_limit: row.get("wip_limit")?,
        status,
        target_start: row
            .get::<_, Option<String>>("target_start")?
            .map(|value| parse_target_date_db(&value, "swimlanes.target_start"))
            .transpose()?,
        target_end: row
            .get::<_, Option<String>>("target_end")?
            .map(|value| parse_target_date_db(&value, "swimlanes.target_end"))
            .transpose()?,
    })
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let status_text: String = row.get("status")?;
    let status = EntryStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in entries.status"))
    })?;

    Ok(Entry {
        id: row.get("id")?,
        branch_id: row.get("branch_id")?,
        column_id: row.get("column_id")?,
        swimlane_id: row.get("swimlane_id")?,
        outline_index: row.get("outline_index")?,
        board_index: row.get("board_index")?,
        subcolumn_index: row.get("subcolumn_index")?,
        text: row.get("text")?,
        status,
        created_by: parse_db_uuid(&row.get::<_, String>("created_by")?, "entries.created_by")?,
        created_at_ms: row.get("created_at_ms")?,
        modified_by: parse_db_uuid(&row.get::<_, String>("modified_by")?, "entries.modified_by")?,
        modified_at_ms: row.get("modified_at_ms")?,
    })
}

pub(crate) fn parse_db_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn parse_db_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn target_date_to_db(value: PrimitiveDateTime) -> RepoResult<String> {
    value
        .format(TARGET_DATE_DB_FORMAT)
        .map_err(|err| RepoError::InvalidData(format!("unformattable target date: {err}")))
}

fn parse_target_date_db(value: &str, column: &'static str) -> RepoResult<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, TARGET_DATE_DB_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid target date `{value}` in {column}"))
    })
}
