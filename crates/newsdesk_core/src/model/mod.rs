//! Domain model for the editorial desk.
//!
//! # Responsibility
//! - Define canonical records for redactors, topics, keywords and articles.
//! - Provide input shapes (drafts, registrations) with structural validation.
//! - Carry field-attached validation failures back to callers.
//!
//! # Invariants
//! - Redactors and articles are identified by stable UUIDs.
//! - Topics and keywords are identified by storage row ids and unique names.

pub mod article;
pub mod catalog;
pub mod redactor;
pub mod validation;
