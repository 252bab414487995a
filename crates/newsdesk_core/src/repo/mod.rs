//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Keep every multi-step write inside one `IMMEDIATE` transaction.
//!
//! # Invariants
//! - Repositories only accept connections with the full schema applied.
//! - Unique-index races are reported as semantic errors (`DuplicateTitle`,
//!   `DuplicateUsername`, ...) or resolved by lookup, never as raw DB errors.

pub mod article_repo;
pub mod error;
pub mod keyword_repo;
mod name_registry;
pub mod redactor_repo;
pub(crate) mod schema;
pub mod topic_repo;

pub use error::{RepoError, RepoResult};
