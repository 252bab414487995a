//! Shared reference data: topics and keywords.
//!
//! # Responsibility
//! - Define topic/keyword records.
//! - Parse comma-separated keyword text into normalized names.
//!
//! # Invariants
//! - Names are unique per kind and stored trimmed.
//! - Keyword names keep their case; `AI` and `ai` are distinct keywords.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum topic name length in characters.
pub const TOPIC_NAME_MAX_CHARS: usize = 120;

pub type TopicId = i64;
pub type KeywordId = i64;

/// Single required category label of an article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
}

/// Free-text tag, many-to-many with articles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub name: String,
}

/// Trims one name; blank input yields `None`.
pub fn normalize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Error message for a topic name over `TOPIC_NAME_MAX_CHARS`, if any.
pub fn topic_name_length_error(name: &str) -> Option<String> {
    let length = name.trim().chars().count();
    (length > TOPIC_NAME_MAX_CHARS).then(|| {
        format!(
            "Ensure this value has at most {TOPIC_NAME_MAX_CHARS} characters (it has {length})."
        )
    })
}

/// Splits comma-separated keyword text into trimmed, deduplicated names.
///
/// Empty segments (`"a,,b"`, trailing commas) are dropped. Output is sorted.
pub fn parse_keyword_text(text: &str) -> Vec<String> {
    text.split(',')
        .filter_map(normalize_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Renders keywords back into the comma-separated edit form.
pub fn join_keyword_names(keywords: &[Keyword]) -> String {
    keywords
        .iter()
        .map(|keyword| keyword.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{join_keyword_names, parse_keyword_text, Keyword};

    #[test]
    fn parse_trims_dedupes_and_drops_blanks() {
        assert_eq!(
            parse_keyword_text(" ai, tech ,ai,, ,tech"),
            vec!["ai".to_string(), "tech".to_string()]
        );
    }

    #[test]
    fn parse_keeps_case_distinct() {
        assert_eq!(
            parse_keyword_text("AI, ai"),
            vec!["AI".to_string(), "ai".to_string()]
        );
    }

    #[test]
    fn parse_of_blank_text_is_empty() {
        assert!(parse_keyword_text("  ").is_empty());
        assert!(parse_keyword_text(",,,").is_empty());
    }

    #[test]
    fn join_renders_edit_form() {
        let keywords = vec![
            Keyword {
                id: 1,
                name: "news".to_string(),
            },
            Keyword {
                id: 2,
                name: "update".to_string(),
            },
        ];
        assert_eq!(join_keyword_names(&keywords), "news, update");
    }
}
