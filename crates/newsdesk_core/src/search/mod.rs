//! Article listing and search entry points.
//!
//! # Responsibility
//! - Filter articles by topic category, free text and author.
//! - Shape paginated result pages inside core.

pub mod articles;
