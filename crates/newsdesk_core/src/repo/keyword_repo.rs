//! Keyword store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide get-or-create, lookup and listing for keywords.
//! - Expose batch resolution used by article keyword reconciliation.
//!
//! # Invariants
//! - Keyword names are unique; lookups are exact (case-sensitive).
//! - Keywords are never deleted, even when no article references them.

use crate::model::catalog::{normalize_name, Keyword};
use crate::repo::name_registry::{self, NamedTable};
use crate::repo::schema::ensure_tables;
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Repository interface for the keyword store.
pub trait KeywordRepository {
    /// Returns the keyword named `name` and whether this call created it.
    fn get_or_create_keyword(&self, name: &str) -> RepoResult<(Keyword, bool)>;
    fn find_keyword_by_name(&self, name: &str) -> RepoResult<Option<Keyword>>;
    /// Lists all keywords sorted by name.
    fn list_keywords(&self) -> RepoResult<Vec<Keyword>>;
}

/// SQLite-backed keyword store.
pub struct SqliteKeywordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeywordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["keywords"])?;
        Ok(Self { conn })
    }
}

impl KeywordRepository for SqliteKeywordRepository<'_> {
    fn get_or_create_keyword(&self, name: &str) -> RepoResult<(Keyword, bool)> {
        let name = normalize_name(name)
            .ok_or_else(|| RepoError::InvalidData("keyword name must not be blank".to_string()))?;
        let (id, created) = name_registry::get_or_create(self.conn, NamedTable::Keywords, &name)?;
        Ok((Keyword { id, name }, created))
    }

    fn find_keyword_by_name(&self, name: &str) -> RepoResult<Option<Keyword>> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        let id = name_registry::find_by_name(self.conn, NamedTable::Keywords, &name)?;
        Ok(id.map(|id| Keyword { id, name }))
    }

    fn list_keywords(&self) -> RepoResult<Vec<Keyword>> {
        let rows = name_registry::list_all(self.conn, NamedTable::Keywords)?;
        Ok(into_keywords(rows))
    }
}

/// Resolves normalized names to keywords, creating the missing ones.
///
/// Returns the keywords sorted by name and the number created.
pub(crate) fn resolve_keywords_in(
    conn: &Connection,
    names: &[String],
) -> RepoResult<(Vec<Keyword>, usize)> {
    let resolved = name_registry::resolve_names(conn, NamedTable::Keywords, names)?;
    Ok((into_keywords(resolved.rows), resolved.created))
}

fn into_keywords(rows: Vec<(i64, String)>) -> Vec<Keyword> {
    rows.into_iter()
        .map(|(id, name)| Keyword { id, name })
        .collect()
}
