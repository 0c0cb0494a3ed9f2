//! UUID utilities for drug orders and catalog references.
//!
//! Two concerns live here:
//! - [`UuidService`]: the identifier assigned to every newly created drug order. Order UUIDs use
//!   the hyphenated lowercase form (`550e8400-e29b-41d4-a716-446655440000`) that the catalog and
//!   persisted orders use.
//! - [`looks_like_uuid`]: the syntactic test the form configurator applies to a drug token to
//!   decide whether it should be resolved by UUID rather than by name or numeric id.
//!
//! ## Canonical order UUID form
//! - Length: 36
//! - Characters: `0-9`, `a-f` and `-` at positions 8, 13, 18 and 23
//!
//! Uppercase or simple (unhyphenated) forms are rejected by [`UuidService::parse`].

mod service;

pub use service::{looks_like_uuid, Uuid, UuidService};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
