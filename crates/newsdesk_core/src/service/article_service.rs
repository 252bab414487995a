//! Article use-case service.
//!
//! # Responsibility
//! - Validate drafts (structure, title uniqueness) before any write.
//! - Default the acting redactor into the author set.
//! - Restrict edits and deletes to the article's own authors.
//! - Serve article detail, index search and per-author listings.
//!
//! # Invariants
//! - Duplicate titles are reported as a `title` field error, including when
//!   a concurrent writer wins the race inside the write transaction.
//! - A failed write leaves no partial article, keyword or link rows behind.

use crate::model::article::{Article, ArticleDraft, ArticleId};
use crate::model::catalog::join_keyword_names;
use crate::model::redactor::RedactorId;
use crate::model::validation::{ValidationErrors, DUPLICATE_TITLE_MESSAGE, INVALID_CHOICE_MESSAGE};
use crate::repo::article_repo::ArticleRepository;
use crate::repo::RepoError;
use crate::search::articles::{
    ArticlePage, ArticleSearchQuery, SearchError, AUTHOR_PAGE_SIZE, INDEX_PAGE_SIZE,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for article use-cases.
#[derive(Debug)]
pub enum ArticleServiceError {
    /// Field-attached input problems; nothing was written.
    Validation(ValidationErrors),
    /// Article does not exist or the actor is not one of its authors.
    ArticleNotFound(ArticleId),
    /// Persistence-layer failure.
    Repo(RepoError),
    Search(SearchError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ArticleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid article: {errors}"),
            Self::ArticleNotFound(id) => write!(f, "article not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent article state: {details}"),
        }
    }
}

impl Error for ArticleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateTitle(_) => {
                Self::Validation(ValidationErrors::single("title", DUPLICATE_TITLE_MESSAGE))
            }
            RepoError::TopicNotFound(_) => {
                Self::Validation(ValidationErrors::single("topic", INVALID_CHOICE_MESSAGE))
            }
            RepoError::RedactorNotFound(_) => {
                Self::Validation(ValidationErrors::single("authors", INVALID_CHOICE_MESSAGE))
            }
            RepoError::ArticleNotFound(id) => Self::ArticleNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<SearchError> for ArticleServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Article service facade over repository implementations.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
    index_page_size: u32,
}

impl<R: ArticleRepository> ArticleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            index_page_size: INDEX_PAGE_SIZE,
        }
    }

    /// Overrides the page size of the public index.
    pub fn with_index_page_size(mut self, page_size: u32) -> Self {
        self.index_page_size = page_size;
        self
    }

    /// Creates one article authored by `actor` (plus any listed co-authors).
    pub fn create_article(
        &self,
        actor: RedactorId,
        draft: ArticleDraft,
    ) -> Result<Article, ArticleServiceError> {
        let started_at = Instant::now();
        self.validate_draft(actor, &draft, None)?;

        let write = draft.into_write(actor);
        let saved = self
            .repo
            .insert_article(&write)
            .map_err(|err| log_write_failure("create", err))?;
        info!(
            "event=article_save module=service status=ok mode=create article_id={} keywords={} created_keywords={} authors={} duration_ms={}",
            saved.id,
            saved.keywords.len(),
            saved.created_keywords,
            write.author_ids.len(),
            started_at.elapsed().as_millis()
        );

        self.repo
            .get_article(saved.id)?
            .ok_or(ArticleServiceError::InconsistentState(
                "created article not found in read-back",
            ))
    }

    /// Re-validates and rewrites one article the actor co-authors.
    ///
    /// Keyword and author sets are replaced by the draft's; the publish date
    /// is kept.
    pub fn update_article(
        &self,
        actor: RedactorId,
        article_id: ArticleId,
        draft: ArticleDraft,
    ) -> Result<Article, ArticleServiceError> {
        let started_at = Instant::now();
        self.ensure_editable(actor, article_id)?;
        self.validate_draft(actor, &draft, Some(article_id))?;

        let write = draft.into_write(actor);
        let saved = self
            .repo
            .update_article(article_id, &write)
            .map_err(|err| log_write_failure("update", err))?;
        info!(
            "event=article_save module=service status=ok mode=update article_id={} keywords={} created_keywords={} authors={} duration_ms={}",
            saved.id,
            saved.keywords.len(),
            saved.created_keywords,
            write.author_ids.len(),
            started_at.elapsed().as_millis()
        );

        self.repo
            .get_article(article_id)?
            .ok_or(ArticleServiceError::InconsistentState(
                "updated article not found in read-back",
            ))
    }

    /// Deletes one article the actor co-authors.
    pub fn delete_article(
        &self,
        actor: RedactorId,
        article_id: ArticleId,
    ) -> Result<(), ArticleServiceError> {
        self.ensure_editable(actor, article_id)?;
        self.repo.delete_article(article_id)?;
        info!(
            "event=article_delete module=service status=ok article_id={} actor={}",
            article_id, actor
        );
        Ok(())
    }

    pub fn get_article(&self, article_id: ArticleId) -> Result<Option<Article>, ArticleServiceError> {
        Ok(self.repo.get_article(article_id)?)
    }

    pub fn is_author(
        &self,
        article_id: ArticleId,
        redactor_id: RedactorId,
    ) -> Result<bool, ArticleServiceError> {
        Ok(self.repo.is_author(article_id, redactor_id)?)
    }

    /// Returns the comma-separated keyword text used to prefill edit forms.
    pub fn keyword_text(&self, article_id: ArticleId) -> Result<String, ArticleServiceError> {
        let article = self
            .repo
            .get_article(article_id)?
            .ok_or(ArticleServiceError::ArticleNotFound(article_id))?;
        Ok(join_keyword_names(&article.keywords))
    }

    /// Public index: optional topic category and free-text query.
    pub fn list_articles(
        &self,
        category: Option<String>,
        text: Option<String>,
        page: u32,
    ) -> Result<ArticlePage, ArticleServiceError> {
        let query = ArticleSearchQuery {
            category,
            text,
            author: None,
            page,
            page_size: Some(self.index_page_size),
        };
        Ok(self.repo.search_articles(&query)?)
    }

    /// Articles co-authored by `redactor_id`, five per page.
    pub fn list_articles_by_author(
        &self,
        redactor_id: RedactorId,
        page: u32,
    ) -> Result<ArticlePage, ArticleServiceError> {
        let query = ArticleSearchQuery::new()
            .author(redactor_id)
            .page(page)
            .page_size(AUTHOR_PAGE_SIZE);
        Ok(self.repo.search_articles(&query)?)
    }

    fn validate_draft(
        &self,
        actor: RedactorId,
        draft: &ArticleDraft,
        current: Option<ArticleId>,
    ) -> Result<(), ArticleServiceError> {
        let mut errors = draft.validate().err().unwrap_or_default();

        let title = draft.title.trim();
        if !title.is_empty()
            && !errors.has_field("title")
            && self.repo.title_taken(title, current)?
        {
            errors.push("title", DUPLICATE_TITLE_MESSAGE);
        }

        if !self.repo.redactor_exists(actor)? {
            errors.push("authors", INVALID_CHOICE_MESSAGE);
        }

        errors.into_result().map_err(|errors| {
            warn!(
                "event=article_validate module=service status=error fields={}",
                errors
                    .errors()
                    .iter()
                    .map(|error| error.field.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            );
            ArticleServiceError::Validation(errors)
        })
    }

    fn ensure_editable(
        &self,
        actor: RedactorId,
        article_id: ArticleId,
    ) -> Result<(), ArticleServiceError> {
        if self.repo.is_author(article_id, actor)? {
            Ok(())
        } else {
            Err(ArticleServiceError::ArticleNotFound(article_id))
        }
    }
}

fn log_write_failure(mode: &'static str, err: RepoError) -> ArticleServiceError {
    let mapped = ArticleServiceError::from(err);
    match &mapped {
        ArticleServiceError::Validation(errors) => warn!(
            "event=article_save module=service status=rejected mode={} reason={}",
            mode, errors
        ),
        other => warn!(
            "event=article_save module=service status=error mode={} error={}",
            mode, other
        ),
    }
    mapped
}
