//! Core domain logic for Tackboard.
//! This crate is the single source of truth for board invariants.

pub mod action;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use action::{Action, ActionError, ActionOutcome};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::column::{Column, ColumnId, ColumnType, LaneStatus};
pub use model::entry::{BoardCell, Entry, EntryId, EntryStatus};
pub use model::identity::Identity;
pub use model::swimlane::{Swimlane, SwimlaneId};
pub use repo::board_repo::{BoardRepository, SqliteBoardRepository};
pub use repo::history_repo::ActionRecord;
pub use repo::identity_repo::{IdentityError, IdentityResult};
pub use repo::{RepoError, RepoResult};
pub use service::BoardService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
