//! SQLite bootstrap and schema migrations for the board store.
//!
//! # Responsibility
//! - Open and configure the connections the command engine runs on.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and migrations applied.
//! - Migration version is tracked via `PRAGMA user_version`.

use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub mod migrations;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "board database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Opens a board database file and applies all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let mut conn = Connection::open(path).map_err(|err| {
        error!("event=db_open module=db status=error mode=file error={err}");
        DbError::Sqlite(err)
    })?;
    bootstrap(&mut conn, "file")?;
    Ok(conn)
}

/// Opens an in-memory board database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let mut conn = Connection::open_in_memory().map_err(|err| {
        error!("event=db_open module=db status=error mode=memory error={err}");
        DbError::Sqlite(err)
    })?;
    bootstrap(&mut conn, "memory")?;
    Ok(conn)
}

fn bootstrap(conn: &mut Connection, mode: &str) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    match migrations::apply_migrations(conn) {
        Ok(()) => {
            info!("event=db_open module=db status=ok mode={mode}");
            Ok(())
        }
        Err(err) => {
            error!("event=db_open module=db status=error mode={mode} error={err}");
            Err(err)
        }
    }
}
