#![allow(dead_code)]

use newsdesk_core::repo::redactor_repo::NewRedactor;
use newsdesk_core::{ArticleId, Redactor, RedactorRepository, SqliteRedactorRepository};
use rusqlite::{params, Connection};

/// Inserts a redactor directly, skipping password hashing.
pub fn seed_redactor(conn: &Connection, username: &str, first: &str, last: &str) -> Redactor {
    SqliteRedactorRepository::try_new(conn)
        .unwrap()
        .create_redactor(&NewRedactor {
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            years_of_experience: None,
            password_hash: "not-a-real-hash".to_string(),
        })
        .unwrap()
}

/// Pins `created_at` so listing order is deterministic.
pub fn set_created_at(conn: &Connection, id: ArticleId, created_at: i64) {
    conn.execute(
        "UPDATE articles SET created_at = ?2 WHERE id = ?1;",
        params![id.to_string(), created_at],
    )
    .unwrap();
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
