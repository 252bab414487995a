//! Storage layer: connection bootstrap, migrations and SQLite error helpers.
//!
//! # Responsibility
//! - Hand out connections that are configured and fully migrated.
//! - Classify SQLite constraint failures for the repository layer.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - No repository reads or writes rows before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// SQLite extended result code for a violated `UNIQUE` constraint.
const SQLITE_CONSTRAINT_UNIQUE: i32 = rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE;

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database is at schema version {db_version}; this build supports up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Returns whether `err` is a `UNIQUE` constraint violation.
///
/// Used by write paths that resolve name races through unique indexes.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Returns the `table.column` named by a unique violation message, if any.
///
/// SQLite reports `UNIQUE constraint failed: articles.title`.
pub fn unique_violation_target(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
        {
            message
                .strip_prefix("UNIQUE constraint failed: ")
                .map(str::trim)
        }
        _ => None,
    }
}
