//! Article model and write payloads.
//!
//! # Responsibility
//! - Define the article read model with resolved topic/authors/keywords.
//! - Define the draft submitted by editors and the normalized write handed
//!   to repositories.
//!
//! # Invariants
//! - `title` is globally unique (case-sensitive exact match) and at most
//!   `TITLE_MAX_CHARS` characters.
//! - `published_date` is set once at creation and never rewritten.
//! - The acting redactor is always part of the written author set.

use crate::model::catalog::{
    normalize_name, parse_keyword_text, topic_name_length_error, Keyword, Topic, TopicId,
};
use crate::model::redactor::{Redactor, RedactorId};
use crate::model::validation::{ValidationErrors, REQUIRED_MESSAGE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable article identifier.
pub type ArticleId = Uuid;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 120;

/// Topic reference accepted by the write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicRef {
    /// Topic row that must already exist.
    Existing(TopicId),
    /// Topic looked up by name and created when absent.
    Named(String),
}

/// Article as shown on list/detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    /// `YYYY-MM-DD`, UTC.
    pub published_date: String,
    pub topic: Topic,
    /// Sorted by username.
    pub authors: Vec<Redactor>,
    /// Sorted by name.
    pub keywords: Vec<Keyword>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Article {
    pub fn has_author(&self, redactor_id: RedactorId) -> bool {
        self.authors.iter().any(|author| author.id == redactor_id)
    }

    pub fn keyword_names(&self) -> Vec<&str> {
        self.keywords
            .iter()
            .map(|keyword| keyword.name.as_str())
            .collect()
    }

    pub fn author_ids(&self) -> Vec<RedactorId> {
        self.authors.iter().map(|author| author.id).collect()
    }
}

/// Editor-submitted article payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub topic: TopicRef,
    /// Comma-separated free text.
    #[serde(default)]
    pub keywords: String,
    /// Additional authors; the acting redactor is added when missing.
    #[serde(default)]
    pub authors: Vec<RedactorId>,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, topic: TopicRef) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            topic,
            keywords: String::new(),
            authors: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_authors(mut self, authors: Vec<RedactorId>) -> Self {
        self.authors = authors;
        self
    }

    /// Structural checks; title uniqueness needs storage and is checked later.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", REQUIRED_MESSAGE);
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(
                "title",
                format!(
                    "Ensure this value has at most {TITLE_MAX_CHARS} characters (it has {}).",
                    title.chars().count()
                ),
            );
        }

        if self.content.trim().is_empty() {
            errors.push("content", REQUIRED_MESSAGE);
        }

        if let TopicRef::Named(name) = &self.topic {
            if normalize_name(name).is_none() {
                errors.push("topic", REQUIRED_MESSAGE);
            } else if let Some(message) = topic_name_length_error(name) {
                errors.push("topic", message);
            }
        }

        errors.into_result()
    }

    /// Resolves the draft into a repository write for `actor`.
    pub fn into_write(self, actor: RedactorId) -> ArticleWrite {
        let keyword_names = parse_keyword_text(&self.keywords);
        let author_ids = authors_including(self.authors, actor);
        let topic = match self.topic {
            TopicRef::Named(name) => TopicRef::Named(name.trim().to_string()),
            existing => existing,
        };
        ArticleWrite {
            title: self.title.trim().to_string(),
            content: self.content,
            topic,
            keyword_names,
            author_ids,
        }
    }
}

/// Normalized write handed to the article repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleWrite {
    pub title: String,
    pub content: String,
    pub topic: TopicRef,
    /// Trimmed, deduplicated keyword names. Replaces existing links.
    pub keyword_names: Vec<String>,
    /// Deduplicated author ids. Replaces existing links.
    pub author_ids: Vec<RedactorId>,
}

/// Deduplicates `authors` and appends `actor` when it is not present.
pub fn authors_including(authors: Vec<RedactorId>, actor: RedactorId) -> Vec<RedactorId> {
    let mut result: Vec<RedactorId> = Vec::with_capacity(authors.len() + 1);
    for id in authors {
        if !result.contains(&id) {
            result.push(id);
        }
    }
    if !result.contains(&actor) {
        result.push(actor);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{authors_including, ArticleDraft, TopicRef, TITLE_MAX_CHARS};
    use crate::model::catalog::TOPIC_NAME_MAX_CHARS;
    use uuid::Uuid;

    #[test]
    fn empty_author_set_defaults_to_actor() {
        let actor = Uuid::new_v4();
        assert_eq!(authors_including(Vec::new(), actor), vec![actor]);
    }

    #[test]
    fn actor_already_present_is_not_duplicated() {
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            authors_including(vec![other, actor, other], actor),
            vec![other, actor]
        );
    }

    #[test]
    fn overlong_title_is_rejected() {
        let draft = ArticleDraft::new(
            "x".repeat(TITLE_MAX_CHARS + 1),
            "body",
            TopicRef::Existing(1),
        );
        assert!(draft.validate().unwrap_err().has_field("title"));
    }

    #[test]
    fn overlong_topic_name_is_rejected() {
        let name = "t".repeat(TOPIC_NAME_MAX_CHARS + 1);
        let errors = ArticleDraft::new("Title", "body", TopicRef::Named(name))
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.messages_for("topic"),
            vec!["Ensure this value has at most 120 characters (it has 121)."]
        );

        let name = format!("  {}  ", "t".repeat(TOPIC_NAME_MAX_CHARS));
        assert!(ArticleDraft::new("Title", "body", TopicRef::Named(name))
            .validate()
            .is_ok());
    }

    #[test]
    fn blank_fields_are_reported_together() {
        let draft = ArticleDraft::new(" ", "", TopicRef::Named("  ".to_string()));
        let errors = draft.validate().unwrap_err();
        assert!(errors.has_field("title"));
        assert!(errors.has_field("content"));
        assert!(errors.has_field("topic"));
    }

    #[test]
    fn into_write_parses_keywords_and_trims_title() {
        let actor = Uuid::new_v4();
        let write = ArticleDraft::new("  AI Update ", "body", TopicRef::Named(" Tech ".to_string()))
            .with_keywords("tech, ai, ai")
            .into_write(actor);
        assert_eq!(write.title, "AI Update");
        assert_eq!(write.topic, TopicRef::Named("Tech".to_string()));
        assert_eq!(write.keyword_names, vec!["ai".to_string(), "tech".to_string()]);
        assert_eq!(write.author_ids, vec![actor]);
    }
}
