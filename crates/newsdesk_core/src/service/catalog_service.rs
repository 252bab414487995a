//! Topic and keyword store service.

use crate::model::catalog::{topic_name_length_error, Keyword, Topic, TopicId};
use crate::model::validation::{ValidationErrors, REQUIRED_MESSAGE};
use crate::repo::keyword_repo::KeywordRepository;
use crate::repo::topic_repo::TopicRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CatalogServiceError {
    Validation(ValidationErrors),
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid name: {errors}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Facade over the topic and keyword stores.
pub struct CatalogService<T: TopicRepository, K: KeywordRepository> {
    topics: T,
    keywords: K,
}

impl<T: TopicRepository, K: KeywordRepository> CatalogService<T, K> {
    pub fn new(topics: T, keywords: K) -> Self {
        Self { topics, keywords }
    }

    /// Returns the topic named `name`, creating it when absent.
    ///
    /// The flag is `true` when this call created the topic.
    pub fn ensure_topic(&self, name: &str) -> Result<(Topic, bool), CatalogServiceError> {
        require_name(name)?;
        if let Some(message) = topic_name_length_error(name) {
            return Err(CatalogServiceError::Validation(ValidationErrors::single(
                "name", message,
            )));
        }
        let (topic, created) = self.topics.get_or_create_topic(name)?;
        if created {
            info!(
                "event=topic_create module=service status=ok topic_id={}",
                topic.id
            );
        }
        Ok((topic, created))
    }

    pub fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, CatalogServiceError> {
        Ok(self.topics.get_topic(id)?)
    }

    pub fn find_topic(&self, name: &str) -> Result<Option<Topic>, CatalogServiceError> {
        Ok(self.topics.find_topic_by_name(name)?)
    }

    pub fn list_topics(&self) -> Result<Vec<Topic>, CatalogServiceError> {
        Ok(self.topics.list_topics()?)
    }

    /// Returns the keyword named `name`, creating it when absent.
    pub fn ensure_keyword(&self, name: &str) -> Result<(Keyword, bool), CatalogServiceError> {
        require_name(name)?;
        Ok(self.keywords.get_or_create_keyword(name)?)
    }

    pub fn find_keyword(&self, name: &str) -> Result<Option<Keyword>, CatalogServiceError> {
        Ok(self.keywords.find_keyword_by_name(name)?)
    }

    pub fn list_keywords(&self) -> Result<Vec<Keyword>, CatalogServiceError> {
        Ok(self.keywords.list_keywords()?)
    }
}

fn require_name(name: &str) -> Result<(), CatalogServiceError> {
    if name.trim().is_empty() {
        return Err(CatalogServiceError::Validation(ValidationErrors::single(
            "name",
            REQUIRED_MESSAGE,
        )));
    }
    Ok(())
}
