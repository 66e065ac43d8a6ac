//! Persistent record of applied actions.
//!
//! # Responsibility
//! - Write one audit row per applied action, inside the action's own
//!   transaction.
//! - Read back the applied history for display and inspection.
//!
//! # Invariants
//! - History rows are immutable once written; there is no update path.
//! - A failed action leaves no history row (transaction atomicity).

use crate::action::{audit_ids, Action, ActionOutcome};
use crate::model::column::ColumnId;
use crate::model::entry::EntryId;
use crate::model::identity::Identity;
use crate::model::swimlane::SwimlaneId;
use crate::repo::board_repo::parse_db_uuid;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

/// One applied action as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub id: i64,
    /// Action discriminator, e.g. `add_column`.
    pub kind: String,
    /// Who performed the action.
    pub user_uid: Uuid,
    pub column_id: Option<ColumnId>,
    pub swimlane_id: Option<SwimlaneId>,
    pub entry_id: Option<EntryId>,
    /// Command-specific parameters as JSON.
    pub params: String,
    pub applied_at_ms: i64,
}

/// Writes the audit row for one applied action.
pub(crate) fn record_applied(
    conn: &Connection,
    action: &Action,
    outcome: &ActionOutcome,
    actor: &Identity,
    applied_at_ms: i64,
) -> RepoResult<i64> {
    let params_json = serde_json::to_string(action).map_err(|err| {
        RepoError::InvalidData(format!("unserializable action parameters: {err}"))
    })?;
    let (column_id, swimlane_id, entry_id) = audit_ids(action, outcome);

    conn.execute(
        "INSERT INTO actions (
            kind,
            user_uid,
            column_id,
            swimlane_id,
            entry_id,
            params,
            applied_at_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            action.kind(),
            actor.uid.to_string(),
            column_id,
            swimlane_id,
            entry_id,
            params_json,
            applied_at_ms,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Lists every applied action in application order.
pub fn list_applied(conn: &Connection) -> RepoResult<Vec<ActionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            kind,
            user_uid,
            column_id,
            swimlane_id,
            entry_id,
            params,
            applied_at_ms
         FROM actions
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let uid_text: String = row.get("user_uid")?;
        records.push(ActionRecord {
            id: row.get("id")?,
            kind: row.get("kind")?,
            user_uid: parse_db_uuid(&uid_text, "actions.user_uid")?,
            column_id: row.get("column_id")?,
            swimlane_id: row.get("swimlane_id")?,
            entry_id: row.get("entry_id")?,
            params: row.get("params")?,
            applied_at_ms: row.get("applied_at_ms")?,
        });
    }
    Ok(records)
}
