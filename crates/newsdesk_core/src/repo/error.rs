//! Repository error type shared by all newsdesk repositories.

use crate::db::DbError;
use crate::model::article::ArticleId;
use crate::model::catalog::TopicId;
use crate::model::redactor::RedactorId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for redactor/catalog/article operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    ArticleNotFound(ArticleId),
    RedactorNotFound(RedactorId),
    TopicNotFound(TopicId),
    /// Another article already uses this exact title.
    DuplicateTitle(String),
    DuplicateUsername(String),
    DuplicateEmail(String),
    /// Required table is missing; the connection was not migrated.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ArticleNotFound(id) => write!(f, "article not found: {id}"),
            Self::RedactorNotFound(id) => write!(f, "redactor not found: {id}"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::DuplicateTitle(title) => write!(f, "article title already exists: `{title}`"),
            Self::DuplicateUsername(name) => write!(f, "username already exists: `{name}`"),
            Self::DuplicateEmail(email) => write!(f, "email already in use: `{email}`"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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
