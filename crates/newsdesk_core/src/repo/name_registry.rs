//! Lookup-or-create over uniquely named reference tables.
//!
//! # Responsibility
//! - Implement idempotent get-or-create for `topics` and `keywords`.
//! - Resolve a batch of names to rows, bulk-inserting the missing ones.
//!
//! # Invariants
//! - Inserts are conditional (`ON CONFLICT(name) DO NOTHING`) and guarded by
//!   the `UNIQUE(name)` index; existence is never pre-checked.
//! - A unique violation that still surfaces means "already exists".

use crate::db::is_unique_violation;
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

/// Bind variables per statement; SQLite caps a statement at 32766.
const NAME_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamedTable {
    Topics,
    Keywords,
}

impl NamedTable {
    fn table(self) -> &'static str {
        match self {
            Self::Topics => "topics",
            Self::Keywords => "keywords",
        }
    }
}

/// Outcome of resolving a batch of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedNames {
    /// `(id, name)` pairs sorted by name.
    pub rows: Vec<(i64, String)>,
    /// Number of rows inserted by this call.
    pub created: usize,
}

/// Returns `(id, created)` for `name`, inserting it when absent.
pub(crate) fn get_or_create(
    conn: &Connection,
    table: NamedTable,
    name: &str,
) -> RepoResult<(i64, bool)> {
    let insert_sql = format!(
        "INSERT INTO {} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING;",
        table.table()
    );
    match conn.execute(&insert_sql, [name]) {
        Ok(1) => return Ok((conn.last_insert_rowid(), true)),
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            debug!(
                "event=name_upsert module=repo status=race table={} resolution=lookup",
                table.table()
            );
        }
        Err(err) => return Err(err.into()),
    }

    let id = find_by_name(conn, table, name)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "{} row `{name}` vanished after conflicting insert",
            table.table()
        ))
    })?;
    Ok((id, false))
}

pub(crate) fn find_by_name(
    conn: &Connection,
    table: NamedTable,
    name: &str,
) -> RepoResult<Option<i64>> {
    let sql = format!("SELECT id FROM {} WHERE name = ?1;", table.table());
    let id = conn.query_row(&sql, [name], |row| row.get(0)).optional()?;
    Ok(id)
}

pub(crate) fn find_by_id(
    conn: &Connection,
    table: NamedTable,
    id: i64,
) -> RepoResult<Option<String>> {
    let sql = format!("SELECT name FROM {} WHERE id = ?1;", table.table());
    let name = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
    Ok(name)
}

/// Lists all rows sorted by name.
pub(crate) fn list_all(conn: &Connection, table: NamedTable) -> RepoResult<Vec<(i64, String)>> {
    let sql = format!("SELECT id, name FROM {} ORDER BY name ASC, id ASC;", table.table());
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push((row.get(0)?, row.get(1)?));
    }
    Ok(items)
}

/// Resolves `names` to rows, bulk-creating every name not yet stored.
///
/// `names` must already be trimmed and deduplicated.
pub(crate) fn resolve_names(
    conn: &Connection,
    table: NamedTable,
    names: &[String],
) -> RepoResult<ResolvedNames> {
    if names.is_empty() {
        return Ok(ResolvedNames {
            rows: Vec::new(),
            created: 0,
        });
    }

    let existing = select_by_names(conn, table, names)?;
    let missing: Vec<&String> = names
        .iter()
        .filter(|name| {
            existing
                .binary_search_by(|(_, stored)| stored.as_str().cmp(name.as_str()))
                .is_err()
        })
        .collect();

    let mut created = 0;
    for chunk in missing.chunks(NAME_CHUNK_SIZE) {
        let placeholders = vec!["(?)"; chunk.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} (name) VALUES {placeholders} ON CONFLICT(name) DO NOTHING;",
            table.table()
        );
        created += match conn.execute(&insert_sql, params_from_iter(chunk.iter())) {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => 0,
            Err(err) => return Err(err.into()),
        };
    }

    let rows = if missing.is_empty() {
        existing
    } else {
        select_by_names(conn, table, names)?
    };

    if rows.len() != names.len() {
        return Err(RepoError::InvalidData(format!(
            "resolved {} of {} {} names",
            rows.len(),
            names.len(),
            table.table()
        )));
    }

    Ok(ResolvedNames { rows, created })
}

/// Selects stored rows for `names`, sorted by name.
fn select_by_names(
    conn: &Connection,
    table: NamedTable,
    names: &[String],
) -> RepoResult<Vec<(i64, String)>> {
    let mut items: Vec<(i64, String)> = Vec::with_capacity(names.len());
    for chunk in names.chunks(NAME_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT id, name FROM {} WHERE name IN ({placeholders});",
            table.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            items.push((row.get(0)?, row.get(1)?));
        }
    }
    items.sort_by(|(_, left), (_, right)| left.cmp(right));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::{get_or_create, resolve_names, NamedTable, NAME_CHUNK_SIZE};
    use crate::db::open_db_in_memory;

    #[test]
    fn get_or_create_is_idempotent() {
        let conn = open_db_in_memory().unwrap();
        let (first, created) = get_or_create(&conn, NamedTable::Topics, "Tech").unwrap();
        assert!(created);
        let (second, created_again) = get_or_create(&conn, NamedTable::Topics, "Tech").unwrap();
        assert!(!created_again);
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_creates_only_missing_names() {
        let conn = open_db_in_memory().unwrap();
        get_or_create(&conn, NamedTable::Keywords, "ai").unwrap();

        let resolved = resolve_names(
            &conn,
            NamedTable::Keywords,
            &["ai".to_string(), "tech".to_string()],
        )
        .unwrap();
        assert_eq!(resolved.created, 1);
        let names: Vec<&str> = resolved.rows.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names, vec!["ai", "tech"]);

        let again = resolve_names(
            &conn,
            NamedTable::Keywords,
            &["ai".to_string(), "tech".to_string()],
        )
        .unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.rows, resolved.rows);
    }

    #[test]
    fn resolve_of_no_names_touches_nothing() {
        let conn = open_db_in_memory().unwrap();
        let resolved = resolve_names(&conn, NamedTable::Keywords, &[]).unwrap();
        assert!(resolved.rows.is_empty());
        assert_eq!(resolved.created, 0);
    }

    #[test]
    fn resolve_spans_several_statement_chunks() {
        let conn = open_db_in_memory().unwrap();
        get_or_create(&conn, NamedTable::Keywords, "k0001").unwrap();

        let mut names: Vec<String> = (0..NAME_CHUNK_SIZE * 2 + 7)
            .map(|index| format!("k{index:04}"))
            .collect();
        names.sort();

        let resolved = resolve_names(&conn, NamedTable::Keywords, &names).unwrap();
        assert_eq!(resolved.created, names.len() - 1);
        let resolved_names: Vec<&String> = resolved.rows.iter().map(|(_, name)| name).collect();
        assert_eq!(resolved_names, names.iter().collect::<Vec<_>>());
    }
}
