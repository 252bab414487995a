//! Redactor directory contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist redactor accounts and profile edits.
//! - Own redactor deletion together with the cascade-delete policy.
//!
//! # Invariants
//! - `username` is unique; `email` is unique among redactors that set one.
//! - Deleting a redactor deletes every article it authors alone, in the same
//!   transaction and before the redactor row is removed.
//! - Co-authored articles survive and only lose the deleted author link.

use crate::db::{is_unique_violation, unique_violation_target};
use crate::model::article::ArticleId;
use crate::model::redactor::{Redactor, RedactorId};
use crate::repo::schema::{contains_pattern, ensure_tables, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const REDACTOR_SELECT_SQL: &str = "SELECT
    id,
    username,
    first_name,
    last_name,
    email,
    years_of_experience,
    created_at
FROM redactors";

/// Insert payload for a new redactor; the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedactor {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub years_of_experience: Option<u32>,
    pub password_hash: String,
}

/// Replacement values for editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub years_of_experience: Option<u32>,
}

/// Repository interface for the redactor directory.
pub trait RedactorRepository {
    fn create_redactor(&self, redactor: &NewRedactor) -> RepoResult<Redactor>;
    fn get_redactor(&self, id: RedactorId) -> RepoResult<Option<Redactor>>;
    fn find_redactor_by_username(&self, username: &str) -> RepoResult<Option<Redactor>>;
    /// Returns the stored PHC hash string for `username`.
    fn password_hash_for(&self, username: &str) -> RepoResult<Option<String>>;
    /// Whether any redactor other than `exclude` uses `email`.
    fn email_in_use(&self, email: &str, exclude: Option<RedactorId>) -> RepoResult<bool>;
    fn update_profile(&self, id: RedactorId, changes: &ProfileChanges) -> RepoResult<()>;
    /// Lists redactors ordered by first name, last name, username.
    ///
    /// `search` matches username, first name or last name, case-insensitive.
    fn list_redactors(&self, search: Option<&str>) -> RepoResult<Vec<Redactor>>;
    /// Deletes a redactor and every article it authors alone.
    ///
    /// Returns the ids of articles removed by the cascade.
    fn delete_redactor(&self, id: RedactorId) -> RepoResult<Vec<ArticleId>>;
}

/// SQLite-backed redactor directory.
pub struct SqliteRedactorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRedactorRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["redactors", "articles", "article_authors"])?;
        Ok(Self { conn })
    }
}

impl RedactorRepository for SqliteRedactorRepository<'_> {
    fn create_redactor(&self, redactor: &NewRedactor) -> RepoResult<Redactor> {
        let id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO redactors (
                id,
                username,
                first_name,
                last_name,
                email,
                years_of_experience,
                password_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                redactor.username.as_str(),
                redactor.first_name.as_str(),
                redactor.last_name.as_str(),
                redactor.email.as_deref(),
                redactor.years_of_experience,
                redactor.password_hash.as_str(),
            ],
        );
        if let Err(err) = inserted {
            return Err(map_unique_violation(
                err,
                &redactor.username,
                redactor.email.as_deref(),
            ));
        }

        load_redactor(self.conn, id)?.ok_or(RepoError::RedactorNotFound(id))
    }

    fn get_redactor(&self, id: RedactorId) -> RepoResult<Option<Redactor>> {
        load_redactor(self.conn, id)
    }

    fn find_redactor_by_username(&self, username: &str) -> RepoResult<Option<Redactor>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REDACTOR_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_redactor_row(row)?)),
            None => Ok(None),
        }
    }

    fn password_hash_for(&self, username: &str) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT password_hash FROM redactors WHERE username = ?1;")?;
        let mut rows = stmt.query([username.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn email_in_use(&self, email: &str, exclude: Option<RedactorId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM redactors
                WHERE email = ?1
                  AND (?2 IS NULL OR id <> ?2)
            );",
            params![email, exclude.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn update_profile(&self, id: RedactorId, changes: &ProfileChanges) -> RepoResult<()> {
        let updated = self.conn.execute(
            "UPDATE redactors
             SET first_name = ?2,
                 last_name = ?3,
                 email = ?4,
                 years_of_experience = ?5
             WHERE id = ?1;",
            params![
                id.to_string(),
                changes.first_name.as_str(),
                changes.last_name.as_str(),
                changes.email.as_deref(),
                changes.years_of_experience,
            ],
        );
        match updated {
            Ok(0) => Err(RepoError::RedactorNotFound(id)),
            Ok(_) => Ok(()),
            Err(err) => Err(map_unique_violation(err, "", changes.email.as_deref())),
        }
    }

    fn list_redactors(&self, search: Option<&str>) -> RepoResult<Vec<Redactor>> {
        let mut sql = String::from(REDACTOR_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(text) = search.map(str::trim).filter(|text| !text.is_empty()) {
            sql.push_str(
                " WHERE username LIKE ? ESCAPE '\\'
                    OR first_name LIKE ? ESCAPE '\\'
                    OR last_name LIKE ? ESCAPE '\\'",
            );
            let pattern = contains_pattern(text);
            for _ in 0..3 {
                bind_values.push(Value::Text(pattern.clone()));
            }
        }
        sql.push_str(" ORDER BY first_name ASC, last_name ASC, username ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut redactors = Vec::new();
        while let Some(row) = rows.next()? {
            redactors.push(parse_redactor_row(row)?);
        }
        Ok(redactors)
    }

    fn delete_redactor(&self, id: RedactorId) -> RepoResult<Vec<ArticleId>> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM redactors WHERE id = ?1);",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::RedactorNotFound(id));
        }

        let orphaned = list_sole_authored_articles(&tx, id_text.as_str())?;
        for article_id in &orphaned {
            tx.execute(
                "DELETE FROM articles WHERE id = ?1;",
                [article_id.to_string()],
            )?;
        }

        // Remaining author links go with the redactor row (ON DELETE CASCADE).
        tx.execute("DELETE FROM redactors WHERE id = ?1;", [id_text.as_str()])?;
        tx.commit()?;

        info!(
            "event=redactor_delete module=repo status=ok redactor_id={} cascaded_articles={}",
            id,
            orphaned.len()
        );
        Ok(orphaned)
    }
}

/// Loads authors of one article sorted by username.
pub(crate) fn load_article_authors(
    conn: &Connection,
    article_id: &str,
) -> RepoResult<Vec<Redactor>> {
    let mut stmt = conn.prepare(
        "SELECT
            r.id,
            r.username,
            r.first_name,
            r.last_name,
            r.email,
            r.years_of_experience,
            r.created_at
         FROM article_authors aa
         INNER JOIN redactors r ON r.id = aa.redactor_id
         WHERE aa.article_id = ?1
         ORDER BY r.username ASC;",
    )?;
    let mut rows = stmt.query([article_id])?;
    let mut authors = Vec::new();
    while let Some(row) = rows.next()? {
        authors.push(parse_redactor_row(row)?);
    }
    Ok(authors)
}

pub(crate) fn redactor_exists(conn: &Connection, id: RedactorId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM redactors WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_redactor(conn: &Connection, id: RedactorId) -> RepoResult<Option<Redactor>> {
    let mut stmt = conn.prepare(&format!("{REDACTOR_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_redactor_row(row)?)),
        None => Ok(None),
    }
}

/// Articles whose author set is exactly `{redactor_id}`.
fn list_sole_authored_articles(
    conn: &Connection,
    redactor_id: &str,
) -> RepoResult<Vec<ArticleId>> {
    let mut stmt = conn.prepare(
        "SELECT aa.article_id
         FROM article_authors aa
         WHERE aa.redactor_id = ?1
           AND (
             SELECT COUNT(*)
             FROM article_authors other
             WHERE other.article_id = aa.article_id
           ) = 1
         ORDER BY aa.article_id ASC;",
    )?;
    let mut rows = stmt.query([redactor_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "article_authors.article_id")?);
    }
    Ok(ids)
}

fn parse_redactor_row(row: &Row<'_>) -> RepoResult<Redactor> {
    let id_text: String = row.get(0)?;
    let years = row
        .get::<_, Option<i64>>(5)?
        .map(|value| {
            u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid years_of_experience `{value}` in redactors"
                ))
            })
        })
        .transpose()?;

    Ok(Redactor {
        id: parse_uuid(&id_text, "redactors.id")?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        years_of_experience: years,
        created_at: row.get(6)?,
    })
}

fn map_unique_violation(err: rusqlite::Error, username: &str, email: Option<&str>) -> RepoError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    match unique_violation_target(&err) {
        Some("redactors.username") => RepoError::DuplicateUsername(username.to_string()),
        Some("redactors.email") => RepoError::DuplicateEmail(email.unwrap_or_default().to_string()),
        _ => err.into(),
    }
}
