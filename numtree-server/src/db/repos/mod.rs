//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for reads (no N+1)
//! - Relies on unique constraints for conflicts (no check-then-insert)
//! - Uses transactions for multi-step writes

pub mod users;
pub mod sessions;
pub mod posts;

use numtree_core::CoreError;

pub use users::{User, UserRepo};
pub use sessions::{Session, SessionRepo};
pub use posts::{Author, DerivationRow, Operation, Post, PostDetail, PostRepo, RowCounts};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{value}' already exists")]
    Conflict { resource: &'static str, value: String },

    /// The write was refused by a domain rule (e.g. division by zero)
    #[error("rejected: {0}")]
    Rejected(#[from] CoreError),

    /// A stored row violates the schema's expectations
    #[error("corrupt row: {reason}")]
    Corrupt { reason: String },
}
