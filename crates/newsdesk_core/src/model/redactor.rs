//! Redactor (editor account) model.
//!
//! # Responsibility
//! - Define the redactor read model and registration/profile inputs.
//! - Run structural checks that need no storage access.
//!
//! # Invariants
//! - `username` is unique and stored trimmed.
//! - `years_of_experience` is non-negative when present.
//! - Password material never appears in the read model.

use crate::model::validation::{ValidationErrors, PASSWORD_MISMATCH_MESSAGE, REQUIRED_MESSAGE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable redactor identifier.
pub type RedactorId = Uuid;

const USERNAME_MAX_CHARS: usize = 150;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Editor/author account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redactor {
    pub id: RedactorId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub years_of_experience: Option<u32>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Redactor {
    /// Returns "First Last" when any name part is set, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Self-service registration payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub years_of_experience: Option<i64>,
    pub password1: String,
    pub password2: String,
}

impl Registration {
    /// Checks everything except username uniqueness.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username", REQUIRED_MESSAGE);
        } else if username.chars().count() > USERNAME_MAX_CHARS
            || !USERNAME_RE.is_match(username)
        {
            errors.push(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        check_years(self.years_of_experience, &mut errors);

        if self.password1.is_empty() {
            errors.push("password1", REQUIRED_MESSAGE);
        }
        if self.password2.is_empty() {
            errors.push("password2", REQUIRED_MESSAGE);
        } else if self.password1 != self.password2 {
            errors.push("password2", PASSWORD_MISMATCH_MESSAGE);
        }

        errors.into_result()
    }
}

/// Profile edit payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub years_of_experience: Option<i64>,
}

impl ProfileUpdate {
    /// Checks everything except email uniqueness.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.push("email", REQUIRED_MESSAGE);
        } else if !EMAIL_RE.is_match(email) {
            errors.push("email", "Enter a valid email address.");
        }
        check_years(self.years_of_experience, &mut errors);
        errors.into_result()
    }
}

/// Converts validated optional years into the stored representation.
pub(crate) fn years_to_stored(value: Option<i64>) -> Option<u32> {
    value.and_then(|years| u32::try_from(years).ok())
}

fn check_years(value: Option<i64>, errors: &mut ValidationErrors) {
    if let Some(years) = value {
        if years < 0 || u32::try_from(years).is_err() {
            errors.push(
                "years_of_experience",
                "Ensure this value is greater than or equal to 0.",
            );
        }
    }
}
