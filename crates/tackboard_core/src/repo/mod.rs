//! Persistence boundary: SQL stays inside this module tree.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod board_repo;
pub mod history_repo;
pub mod identity_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from board persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A row expected to be present was not; the store is inconsistent with
    /// the validation snapshot.
    Missing { table: &'static str, id: i64 },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Missing { table, id } => {
                write!(f, "expected row missing: {table} id {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Missing { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
