//! Identity check-in and lookup.
//!
//! # Responsibility
//! - Get-or-create the acting user row on check-in.
//! - Refuse ambiguous name/uid pairings instead of silently resolving them.
//!
//! # Invariants
//! - `uid` is globally unique; name matching is case-insensitive.
//! - User rows are never deleted.

use crate::db::DbError;
use crate::model::identity::Identity;
use crate::repo::board_repo::parse_db_uuid;
use crate::repo::RepoError;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors from identity check-in and lookup.
#[derive(Debug)]
pub enum IdentityError {
    /// A command required an acting identity but none is checked in.
    NoCurrentIdentity,
    /// The presented name/uid pair partially matches existing records.
    Conflict {
        name: String,
        uid: Uuid,
        same_name: i64,
        same_uid: i64,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCurrentIdentity => write!(f, "no user is currently checked in"),
            Self::Conflict {
                name,
                uid,
                same_name,
                same_uid,
            } => write!(
                f,
                "ambiguous identity: {same_name} user(s) share name `{name}`, \
                 {same_uid} user(s) share uid `{uid}`"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for IdentityError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for IdentityError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for IdentityError {
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

/// Gets or lazily creates the user row for a `(name, uid)` pair.
///
/// A record matching both name (case-insensitively) and uid is returned as
/// is. When only one of the two matches an existing record the pair is
/// ambiguous and check-in fails with [`IdentityError::Conflict`].
pub fn check_in(conn: &Connection, name: &str, uid: Uuid) -> IdentityResult<Identity> {
    let existing = conn
        .query_row(
            "SELECT uid, name
             FROM users
             WHERE name = ?1 COLLATE NOCASE
               AND uid = ?2;",
            params![name, uid.to_string()],
            parse_user_row,
        )
        .optional()?;
    if let Some(identity) = existing {
        return identity;
    }

    let same_name: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE name = ?1 COLLATE NOCASE;",
        params![name],
        |row| row.get(0),
    )?;
    let same_uid: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE uid = ?1;",
        params![uid.to_string()],
        |row| row.get(0),
    )?;
    if same_name > 0 || same_uid > 0 {
        return Err(IdentityError::Conflict {
            name: name.to_string(),
            uid,
            same_name,
            same_uid,
        });
    }

    conn.execute(
        "INSERT INTO users (uid, name) VALUES (?1, ?2);",
        params![uid.to_string(), name],
    )?;
    info!("event=user_created module=identity status=ok uid={uid}");

    Ok(Identity {
        uid,
        name: name.to_string(),
    })
}

/// Looks up one user by uid.
pub fn user_by_uid(conn: &Connection, uid: Uuid) -> IdentityResult<Option<Identity>> {
    let found = conn
        .query_row(
            "SELECT uid, name FROM users WHERE uid = ?1;",
            params![uid.to_string()],
            parse_user_row,
        )
        .optional()?;
    found.transpose()
}

fn parse_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IdentityResult<Identity>> {
    let uid_text: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(match parse_db_uuid(&uid_text, "users.uid") {
        Ok(uid) => Ok(Identity { uid, name }),
        Err(err) => Err(err.into()),
    })
}
