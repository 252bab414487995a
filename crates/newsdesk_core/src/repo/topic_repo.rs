//! Topic store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide get-or-create, lookup and listing for topics.
//!
//! # Invariants
//! - Topic names are unique; lookups are exact (case-sensitive).
//! - Topics are never deleted by this repository.

use crate::model::catalog::{normalize_name, Topic, TopicId};
use crate::repo::name_registry::{self, NamedTable};
use crate::repo::schema::ensure_tables;
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Repository interface for the topic store.
pub trait TopicRepository {
    /// Returns the topic named `name` and whether this call created it.
    fn get_or_create_topic(&self, name: &str) -> RepoResult<(Topic, bool)>;
    fn get_topic(&self, id: TopicId) -> RepoResult<Option<Topic>>;
    fn find_topic_by_name(&self, name: &str) -> RepoResult<Option<Topic>>;
    /// Lists all topics sorted by name.
    fn list_topics(&self) -> RepoResult<Vec<Topic>>;
}

/// SQLite-backed topic store.
pub struct SqliteTopicRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTopicRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["topics"])?;
        Ok(Self { conn })
    }
}

impl TopicRepository for SqliteTopicRepository<'_> {
    fn get_or_create_topic(&self, name: &str) -> RepoResult<(Topic, bool)> {
        get_or_create_topic_in(self.conn, name)
    }

    fn get_topic(&self, id: TopicId) -> RepoResult<Option<Topic>> {
        let name = name_registry::find_by_id(self.conn, NamedTable::Topics, id)?;
        Ok(name.map(|name| Topic { id, name }))
    }

    fn find_topic_by_name(&self, name: &str) -> RepoResult<Option<Topic>> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        let id = name_registry::find_by_name(self.conn, NamedTable::Topics, &name)?;
        Ok(id.map(|id| Topic { id, name }))
    }

    fn list_topics(&self) -> RepoResult<Vec<Topic>> {
        let rows = name_registry::list_all(self.conn, NamedTable::Topics)?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Topic { id, name })
            .collect())
    }
}

/// Get-or-create usable inside an open transaction.
pub(crate) fn get_or_create_topic_in(conn: &Connection, name: &str) -> RepoResult<(Topic, bool)> {
    let name = normalize_name(name)
        .ok_or_else(|| RepoError::InvalidData("topic name must not be blank".to_string()))?;
    let (id, created) = name_registry::get_or_create(conn, NamedTable::Topics, &name)?;
    Ok((Topic { id, name }, created))
}

/// Loads a topic that must exist.
pub(crate) fn load_topic(conn: &Connection, id: TopicId) -> RepoResult<Topic> {
    name_registry::find_by_id(conn, NamedTable::Topics, id)?
        .map(|name| Topic { id, name })
        .ok_or(RepoError::TopicNotFound(id))
}
