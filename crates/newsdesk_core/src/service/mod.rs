//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn storage-level conflicts into field-attached validation failures.
//! - Keep callers (CLI, future HTTP layer) decoupled from storage details.

pub mod article_service;
pub mod catalog_service;
pub mod redactor_service;
