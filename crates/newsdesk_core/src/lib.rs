//! Core domain logic for the Newsdesk editorial store.
//! This crate owns every business invariant; front ends only call services.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, NewsdeskConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleDraft, ArticleId, TopicRef};
pub use model::catalog::{Keyword, KeywordId, Topic, TopicId};
pub use model::redactor::{ProfileUpdate, Redactor, RedactorId, Registration};
pub use model::validation::{FieldError, ValidationErrors};
pub use repo::article_repo::{ArticleRepository, SqliteArticleRepository};
pub use repo::keyword_repo::{KeywordRepository, SqliteKeywordRepository};
pub use repo::redactor_repo::{RedactorRepository, SqliteRedactorRepository};
pub use repo::topic_repo::{SqliteTopicRepository, TopicRepository};
pub use repo::{RepoError, RepoResult};
pub use search::articles::{ArticlePage, ArticleSearchQuery, SearchError, SearchResult};
pub use service::article_service::{ArticleService, ArticleServiceError};
pub use service::catalog_service::{CatalogService, CatalogServiceError};
pub use service::redactor_service::{CascadeReport, RedactorService, RedactorServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
