//! The board service: the one entry point through which callers mutate the
//! board.
//!
//! # Responsibility
//! - Hold the checked-in identity for the session.
//! - Wrap every applied action in a single immediate transaction together
//!   with its audit row.
//! - Expose the read surface the GUI layer renders from.
//!
//! # Invariants
//! - No action is applied without a current identity.
//! - A rejected or failed action rolls back completely; the store and the
//!   history are left exactly as they were.

use crate::action::{now_epoch_ms, Action, ActionError, ActionOutcome};
use crate::model::column::{Column, ColumnId};
use crate::model::entry::{BoardCell, Entry, EntryId};
use crate::model::identity::Identity;
use crate::model::swimlane::{Swimlane, SwimlaneId};
use crate::repo::board_repo::{BoardRepository, SqliteBoardRepository};
use crate::repo::history_repo::{self, ActionRecord};
use crate::repo::identity_repo::{self, IdentityError, IdentityResult};
use crate::repo::RepoResult;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Session facade over one open board database.
pub struct BoardService<'conn> {
    conn: &'conn Connection,
    current: Option<Identity>,
}

impl<'conn> BoardService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            current: None,
        }
    }

    /// Checks an identity in and makes it the session's current actor.
    ///
    /// Creates the identity record on first contact; a name or uid clash
    /// with an existing record is a hard error and leaves the session's
    /// current actor unchanged.
    pub fn check_in(&mut self, name: &str, uid: Uuid) -> IdentityResult<Identity> {
        let identity = identity_repo::check_in(self.conn, name, uid)?;
        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// The checked-in identity, or `NoCurrentIdentity` if nobody has.
    pub fn current_identity(&self) -> IdentityResult<&Identity> {
        self.current
            .as_ref()
            .ok_or(IdentityError::NoCurrentIdentity)
    }

    /// Checks an action against current state without applying it.
    pub fn validate(&self, action: &Action) -> Result<(), ActionError> {
        action.validate(self.conn)
    }

    /// Applies one action atomically and records it in the history.
    pub fn apply(&self, action: &Action) -> Result<ActionOutcome, ActionError> {
        let actor = self.current_identity()?.clone();
        let tx =
            Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let now_ms = now_epoch_ms();

        let outcome = match action.apply_on(&tx, &actor, now_ms) {
            Ok(outcome) => outcome,
            Err(err) => {
                // Dropping the transaction rolls everything back.
                warn!(
                    "event=action_rejected module=board_service kind={} user={} reason={err}",
                    action.kind(),
                    actor.uid
                );
                return Err(err);
            }
        };
        let record_id = history_repo::record_applied(&tx, action, &outcome, &actor, now_ms)?;
        tx.commit()?;

        info!(
            "event=action_applied module=board_service kind={} user={} record_id={record_id}",
            action.kind(),
            actor.uid
        );
        Ok(outcome)
    }

    /// Every applied action in application order.
    pub fn history(&self) -> RepoResult<Vec<ActionRecord>> {
        history_repo::list_applied(self.conn)
    }

    fn repo(&self) -> SqliteBoardRepository<'conn> {
        SqliteBoardRepository::new(self.conn)
    }

    pub fn column(&self, id: ColumnId, include_removed: bool) -> RepoResult<Option<Column>> {
        self.repo().column(id, include_removed)
    }

    pub fn active_columns(&self) -> RepoResult<Vec<Column>> {
        self.repo().active_columns()
    }

    pub fn all_columns(&self) -> RepoResult<Vec<Column>> {
        self.repo().all_columns()
    }

    pub fn column_card_count(&self, id: ColumnId) -> RepoResult<i64> {
        self.repo().column_card_count(id, None)
    }

    pub fn swimlane(&self, id: SwimlaneId, include_removed: bool) -> RepoResult<Option<Swimlane>> {
        self.repo().swimlane(id, include_removed)
    }

    pub fn active_swimlanes(&self) -> RepoResult<Vec<Swimlane>> {
        self.repo().active_swimlanes()
    }

    pub fn swimlane_card_count(&self, id: SwimlaneId) -> RepoResult<i64> {
        self.repo().swimlane_card_count(id, None)
    }

    pub fn entry(&self, id: EntryId, include_removed: bool) -> RepoResult<Option<Entry>> {
        self.repo().entry(id, include_removed)
    }

    /// Non-removed children of one outline parent; `None` lists the roots.
    pub fn outline_children(&self, parent: Option<EntryId>) -> RepoResult<Vec<Entry>> {
        self.repo().outline_children(parent)
    }

    pub fn cell_cards(&self, cell: &BoardCell) -> RepoResult<Vec<Entry>> {
        self.repo().cell_cards(cell)
    }
}
