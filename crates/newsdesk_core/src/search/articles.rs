//! Paginated article search over SQLite.
//!
//! # Responsibility
//! - Build one filtered query for index, category and "my articles" pages.
//! - Return typed pages with total counts.
//!
//! # Invariants
//! - Each matching article appears once, however many authors or keywords
//!   match the text query.
//! - Ordering is deterministic: `created_at DESC, id ASC`.
//! - Page numbers are 1-based; page 0 is treated as page 1.

use crate::db::DbError;
use crate::model::article::{Article, ArticleId};
use crate::model::redactor::RedactorId;
use crate::repo::article_repo::load_article;
use crate::repo::schema::{contains_pattern, parse_uuid};
use crate::repo::RepoError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Page size of the public article index.
pub const INDEX_PAGE_SIZE: u32 = 9;
/// Page size of a redactor's own article list.
pub const AUTHOR_PAGE_SIZE: u32 = 5;
const PAGE_SIZE_MAX: u32 = 50;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Filters and pagination for article listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSearchQuery {
    /// Topic name, matched case-insensitively and exactly.
    pub category: Option<String>,
    /// Substring matched against title, author first/last name and keywords.
    pub text: Option<String>,
    /// Restricts to articles authored by this redactor.
    pub author: Option<RedactorId>,
    /// 1-based page number.
    pub page: u32,
    /// Defaults to `INDEX_PAGE_SIZE`, clamps to 50.
    pub page_size: Option<u32>,
}

impl ArticleSearchQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn author(mut self, author: RedactorId) -> Self {
        self.author = Some(author);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub page: u32,
    pub page_size: u32,
    /// Matching articles across all pages.
    pub total: u64,
    pub has_next: bool,
}

impl ArticlePage {
    pub fn page_count(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(u64::from(self.page_size))
        }
    }
}

/// Normalizes page size: default for `None`/0, capped at 50.
pub fn normalize_page_size(page_size: Option<u32>) -> u32 {
    match page_size {
        None | Some(0) => INDEX_PAGE_SIZE,
        Some(value) if value > PAGE_SIZE_MAX => PAGE_SIZE_MAX,
        Some(value) => value,
    }
}

/// Lists articles matching `query`, newest first.
pub fn search_articles(conn: &Connection, query: &ArticleSearchQuery) -> SearchResult<ArticlePage> {
    let page = query.page.max(1);
    let page_size = normalize_page_size(query.page_size);
    let (where_sql, bind_values) = build_filter(query);

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*)
             FROM articles a
             INNER JOIN topics t ON t.id = a.topic_id
             WHERE 1 = 1{where_sql};"
        ),
        params_from_iter(bind_values.iter()),
        |row| row.get(0),
    )?;
    let total = u64::try_from(total)
        .map_err(|_| SearchError::InvalidData(format!("negative article count {total}")))?;

    let offset = u64::from(page - 1) * u64::from(page_size);
    let mut ids: Vec<ArticleId> = Vec::new();
    if offset < total {
        let mut page_values = bind_values;
        page_values.push(Value::Integer(i64::from(page_size)));
        page_values.push(Value::Integer(offset as i64));

        let mut stmt = conn.prepare(&format!(
            "SELECT a.id
             FROM articles a
             INNER JOIN topics t ON t.id = a.topic_id
             WHERE 1 = 1{where_sql}
             ORDER BY a.created_at DESC, a.id ASC
             LIMIT ? OFFSET ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(page_values))?;
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "articles.id")?);
        }
    }

    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        let article = load_article(conn, id)?
            .ok_or_else(|| SearchError::InvalidData(format!("article {id} vanished mid-query")))?;
        items.push(article);
    }

    Ok(ArticlePage {
        has_next: offset + (items.len() as u64) < total,
        items,
        page,
        page_size,
        total,
    })
}

fn build_filter(query: &ArticleSearchQuery) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut values = Vec::new();

    if let Some(category) = non_blank(query.category.as_deref()) {
        sql.push_str(" AND t.name = ? COLLATE NOCASE");
        values.push(Value::Text(category.to_string()));
    }

    if let Some(author) = query.author {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM article_authors mine
                WHERE mine.article_id = a.id
                  AND mine.redactor_id = ?
            )",
        );
        values.push(Value::Text(author.to_string()));
    }

    if let Some(text) = non_blank(query.text.as_deref()) {
        sql.push_str(
            " AND (
                a.title LIKE ? ESCAPE '\\'
                OR EXISTS (
                    SELECT 1
                    FROM article_authors aa
                    INNER JOIN redactors r ON r.id = aa.redactor_id
                    WHERE aa.article_id = a.id
                      AND (r.first_name LIKE ? ESCAPE '\\' OR r.last_name LIKE ? ESCAPE '\\')
                )
                OR EXISTS (
                    SELECT 1
                    FROM article_keywords ak
                    INNER JOIN keywords k ON k.id = ak.keyword_id
                    WHERE ak.article_id = a.id
                      AND k.name LIKE ? ESCAPE '\\'
                )
            )",
        );
        let pattern = contains_pattern(text);
        for _ in 0..4 {
            values.push(Value::Text(pattern.clone()));
        }
    }

    (sql, values)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
