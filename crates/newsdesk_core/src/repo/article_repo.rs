//! Article repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist article rows together with their topic, author and keyword links.
//! - Run keyword reconciliation in the same transaction as the row write.
//!
//! # Invariants
//! - Titles are globally unique (exact, case-sensitive). A title taken by a
//!   concurrent writer surfaces as `RepoError::DuplicateTitle`.
//! - Keyword and author links are replaced wholesale on every save.
//! - Keywords are created lazily and never deleted here.
//! - `published_date` is written on insert only.

use crate::db::{is_unique_violation, unique_violation_target};
use crate::model::article::{Article, ArticleId, ArticleWrite, TopicRef};
use crate::model::catalog::{Keyword, Topic};
use crate::model::redactor::RedactorId;
use crate::repo::keyword_repo::resolve_keywords_in;
use crate::repo::redactor_repo::{load_article_authors, redactor_exists};
use crate::repo::schema::{ensure_tables, parse_uuid};
use crate::repo::topic_repo::{get_or_create_topic_in, load_topic};
use crate::repo::{RepoError, RepoResult};
use crate::search::articles::{search_articles, ArticlePage, ArticleSearchQuery, SearchResult};
use log::debug;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    published_date,
    topic_id,
    created_at,
    updated_at
FROM articles";

/// Summary of one successful article save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSaved {
    pub id: ArticleId,
    pub topic: Topic,
    /// Linked keywords after reconciliation, sorted by name.
    pub keywords: Vec<Keyword>,
    /// Keywords inserted into the store by this save.
    pub created_keywords: usize,
}

/// Repository interface for article persistence.
pub trait ArticleRepository {
    /// Whether an article other than `exclude` already has exactly `title`.
    fn title_taken(&self, title: &str, exclude: Option<ArticleId>) -> RepoResult<bool>;
    /// Inserts a new article with its links in one transaction.
    fn insert_article(&self, write: &ArticleWrite) -> RepoResult<ArticleSaved>;
    /// Rewrites an existing article and replaces its links in one transaction.
    fn update_article(&self, id: ArticleId, write: &ArticleWrite) -> RepoResult<ArticleSaved>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    fn is_author(&self, id: ArticleId, redactor_id: RedactorId) -> RepoResult<bool>;
    /// Deletes one article; link rows cascade.
    fn delete_article(&self, id: ArticleId) -> RepoResult<()>;
    fn redactor_exists(&self, id: RedactorId) -> RepoResult<bool>;
    /// Lists one page of articles matching `query`.
    fn search_articles(&self, query: &ArticleSearchQuery) -> SearchResult<ArticlePage>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                "articles",
                "article_authors",
                "article_keywords",
                "topics",
                "keywords",
                "redactors",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn title_taken(&self, title: &str, exclude: Option<ArticleId>) -> RepoResult<bool> {
        title_taken_in(self.conn, title, exclude)
    }

    fn insert_article(&self, write: &ArticleWrite) -> RepoResult<ArticleSaved> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let topic = resolve_topic(&tx, &write.topic)?;
        ensure_authors_exist(&tx, &write.author_ids)?;
        if title_taken_in(&tx, &write.title, None)? {
            return Err(RepoError::DuplicateTitle(write.title.clone()));
        }

        tx.execute(
            "INSERT INTO articles (id, title, content, topic_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                write.title.as_str(),
                write.content.as_str(),
                topic.id,
            ],
        )
        .map_err(|err| map_title_violation(err, &write.title))?;

        let (keywords, created_keywords) = replace_links(&tx, id, write)?;
        tx.commit()?;

        Ok(ArticleSaved {
            id,
            topic,
            keywords,
            created_keywords,
        })
    }

    fn update_article(&self, id: ArticleId, write: &ArticleWrite) -> RepoResult<ArticleSaved> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let topic = resolve_topic(&tx, &write.topic)?;
        ensure_authors_exist(&tx, &write.author_ids)?;
        if title_taken_in(&tx, &write.title, Some(id))? {
            return Err(RepoError::DuplicateTitle(write.title.clone()));
        }

        let changed = tx
            .execute(
                "UPDATE articles
                 SET title = ?2,
                     content = ?3,
                     topic_id = ?4,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    id.to_string(),
                    write.title.as_str(),
                    write.content.as_str(),
                    topic.id,
                ],
            )
            .map_err(|err| map_title_violation(err, &write.title))?;
        if changed == 0 {
            return Err(RepoError::ArticleNotFound(id));
        }

        let (keywords, created_keywords) = replace_links(&tx, id, write)?;
        tx.commit()?;

        Ok(ArticleSaved {
            id,
            topic,
            keywords,
            created_keywords,
        })
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        load_article(self.conn, id)
    }

    fn is_author(&self, id: ArticleId, redactor_id: RedactorId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM article_authors
                WHERE article_id = ?1
                  AND redactor_id = ?2
            );",
            params![id.to_string(), redactor_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM articles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ArticleNotFound(id));
        }
        Ok(())
    }

    fn redactor_exists(&self, id: RedactorId) -> RepoResult<bool> {
        redactor_exists(self.conn, id)
    }

    fn search_articles(&self, query: &ArticleSearchQuery) -> SearchResult<ArticlePage> {
        search_articles(self.conn, query)
    }
}

/// Loads one article with topic, authors and keywords.
pub(crate) fn load_article(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let id_text = id.to_string();
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_text.as_str()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let stored_id: String = row.get(0)?;
    let topic_id: i64 = row.get(4)?;
    Ok(Some(Article {
        id: parse_uuid(&stored_id, "articles.id")?,
        title: row.get(1)?,
        content: row.get(2)?,
        published_date: row.get(3)?,
        topic: load_topic(conn, topic_id)?,
        authors: load_article_authors(conn, id_text.as_str())?,
        keywords: load_article_keywords(conn, id_text.as_str())?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    }))
}

fn title_taken_in(conn: &Connection, title: &str, exclude: Option<ArticleId>) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM articles
            WHERE title = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![title, exclude.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn resolve_topic(conn: &Connection, topic: &TopicRef) -> RepoResult<Topic> {
    match topic {
        TopicRef::Existing(id) => load_topic(conn, *id),
        TopicRef::Named(name) => {
            let (topic, created) = get_or_create_topic_in(conn, name)?;
            if created {
                debug!(
                    "event=topic_create module=repo status=ok topic_id={}",
                    topic.id
                );
            }
            Ok(topic)
        }
    }
}

fn ensure_authors_exist(conn: &Connection, author_ids: &[RedactorId]) -> RepoResult<()> {
    for author_id in author_ids {
        if !redactor_exists(conn, *author_id)? {
            return Err(RepoError::RedactorNotFound(*author_id));
        }
    }
    Ok(())
}

/// Replaces keyword and author links; returns linked keywords and how many
/// keywords were newly created.
fn replace_links(
    conn: &Connection,
    id: ArticleId,
    write: &ArticleWrite,
) -> RepoResult<(Vec<Keyword>, usize)> {
    let id_text = id.to_string();

    let (keywords, created) = resolve_keywords_in(conn, &write.keyword_names)?;
    conn.execute(
        "DELETE FROM article_keywords WHERE article_id = ?1;",
        [id_text.as_str()],
    )?;
    for keyword in &keywords {
        conn.execute(
            "INSERT INTO article_keywords (article_id, keyword_id) VALUES (?1, ?2);",
            params![id_text.as_str(), keyword.id],
        )?;
    }

    conn.execute(
        "DELETE FROM article_authors WHERE article_id = ?1;",
        [id_text.as_str()],
    )?;
    for author_id in &write.author_ids {
        conn.execute(
            "INSERT INTO article_authors (article_id, redactor_id) VALUES (?1, ?2);",
            params![id_text.as_str(), author_id.to_string()],
        )?;
    }

    Ok((keywords, created))
}

fn load_article_keywords(conn: &Connection, article_id: &str) -> RepoResult<Vec<Keyword>> {
    let mut stmt = conn.prepare(
        "SELECT k.id, k.name
         FROM article_keywords ak
         INNER JOIN keywords k ON k.id = ak.keyword_id
         WHERE ak.article_id = ?1
         ORDER BY k.name ASC;",
    )?;
    let mut rows = stmt.query([article_id])?;
    let mut keywords = Vec::new();
    while let Some(row) = rows.next()? {
        keywords.push(Keyword {
            id: row.get(0)?,
            name: row.get(1)?,
        });
    }
    Ok(keywords)
}

fn map_title_violation(err: rusqlite::Error, title: &str) -> RepoError {
    if is_unique_violation(&err) && unique_violation_target(&err) == Some("articles.title") {
        return RepoError::DuplicateTitle(title.to_string());
    }
    err.into()
}
