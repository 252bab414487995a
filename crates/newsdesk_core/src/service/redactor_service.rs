//! Redactor directory use-case service.
//!
//! # Responsibility
//! - Register redactors with hashed passwords.
//! - Apply profile edits with email uniqueness checks.
//! - Delete redactors through the cascade-delete policy.
//!
//! # Invariants
//! - Usernames and emails stay unique; conflicts become field errors.
//! - Deleting a redactor removes its sole-authored articles atomically.

use crate::model::article::ArticleId;
use crate::model::redactor::{years_to_stored, ProfileUpdate, Redactor, RedactorId, Registration};
use crate::model::validation::{
    ValidationErrors, DUPLICATE_EMAIL_MESSAGE, DUPLICATE_USERNAME_MESSAGE,
};
use crate::password::{hash_password, verify_password};
use crate::repo::redactor_repo::{NewRedactor, ProfileChanges, RedactorRepository};
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from redactor directory operations.
#[derive(Debug)]
pub enum RedactorServiceError {
    Validation(ValidationErrors),
    RedactorNotFound(RedactorId),
    /// Password hashing backend failure.
    PasswordHash(String),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for RedactorServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid redactor input: {errors}"),
            Self::RedactorNotFound(id) => write!(f, "redactor not found: {id}"),
            Self::PasswordHash(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent redactor state: {details}"),
        }
    }
}

impl Error for RedactorServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RedactorServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RedactorNotFound(id) => Self::RedactorNotFound(id),
            RepoError::DuplicateUsername(_) => {
                Self::Validation(ValidationErrors::single("username", DUPLICATE_USERNAME_MESSAGE))
            }
            RepoError::DuplicateEmail(_) => {
                Self::Validation(ValidationErrors::single("email", DUPLICATE_EMAIL_MESSAGE))
            }
            other => Self::Repo(other),
        }
    }
}

/// Outcome of deleting one redactor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub redactor_id: RedactorId,
    /// Articles the redactor authored alone, deleted with it.
    pub deleted_articles: Vec<ArticleId>,
}

/// Redactor directory service facade.
pub struct RedactorService<R: RedactorRepository> {
    repo: R,
}

impl<R: RedactorRepository> RedactorService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new redactor.
    pub fn register(&self, input: Registration) -> Result<Redactor, RedactorServiceError> {
        let mut errors = input.validate().err().unwrap_or_default();
        let username = input.username.trim().to_string();
        if !errors.has_field("username")
            && self.repo.find_redactor_by_username(&username)?.is_some()
        {
            errors.push("username", DUPLICATE_USERNAME_MESSAGE);
        }
        errors
            .into_result()
            .map_err(RedactorServiceError::Validation)?;

        let password_hash =
            hash_password(&input.password1).map_err(RedactorServiceError::PasswordHash)?;
        let redactor = self.repo.create_redactor(&NewRedactor {
            username,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: None,
            years_of_experience: years_to_stored(input.years_of_experience),
            password_hash,
        })?;

        info!(
            "event=redactor_register module=service status=ok redactor_id={}",
            redactor.id
        );
        Ok(redactor)
    }

    /// Returns the redactor when `password` matches the stored hash.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Redactor>, RedactorServiceError> {
        let Some(stored_hash) = self.repo.password_hash_for(username)? else {
            return Ok(None);
        };
        if !verify_password(password, &stored_hash) {
            warn!("event=redactor_auth module=service status=rejected");
            return Ok(None);
        }
        Ok(self.repo.find_redactor_by_username(username)?)
    }

    /// Whether `password` is correct for `username`; unknown users never match.
    pub fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, RedactorServiceError> {
        Ok(self
            .repo
            .password_hash_for(username)?
            .is_some_and(|stored_hash| verify_password(password, &stored_hash)))
    }

    /// Replaces editable profile fields.
    pub fn update_profile(
        &self,
        id: RedactorId,
        update: ProfileUpdate,
    ) -> Result<Redactor, RedactorServiceError> {
        if self.repo.get_redactor(id)?.is_none() {
            return Err(RedactorServiceError::RedactorNotFound(id));
        }

        let mut errors = update.validate().err().unwrap_or_default();
        let email = update.email.trim().to_string();
        if !errors.has_field("email") && self.repo.email_in_use(&email, Some(id))? {
            errors.push("email", DUPLICATE_EMAIL_MESSAGE);
        }
        errors
            .into_result()
            .map_err(RedactorServiceError::Validation)?;

        self.repo.update_profile(
            id,
            &ProfileChanges {
                first_name: update.first_name.trim().to_string(),
                last_name: update.last_name.trim().to_string(),
                email: Some(email),
                years_of_experience: years_to_stored(update.years_of_experience),
            },
        )?;

        self.repo
            .get_redactor(id)?
            .ok_or(RedactorServiceError::InconsistentState(
                "updated redactor not found in read-back",
            ))
    }

    pub fn get_redactor(&self, id: RedactorId) -> Result<Option<Redactor>, RedactorServiceError> {
        Ok(self.repo.get_redactor(id)?)
    }

    pub fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Redactor>, RedactorServiceError> {
        Ok(self.repo.find_redactor_by_username(username)?)
    }

    /// Lists redactors ordered by name, optionally filtered by `search`.
    pub fn list_redactors(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<Redactor>, RedactorServiceError> {
        Ok(self.repo.list_redactors(search)?)
    }

    /// Deletes a redactor and every article it authored alone.
    pub fn delete_redactor(&self, id: RedactorId) -> Result<CascadeReport, RedactorServiceError> {
        let deleted_articles = self.repo.delete_redactor(id)?;
        info!(
            "event=redactor_delete module=service status=ok redactor_id={} deleted_articles={}",
            id,
            deleted_articles.len()
        );
        Ok(CascadeReport {
            redactor_id: id,
            deleted_articles,
        })
    }
}
