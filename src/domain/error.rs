//! Domain-level failures.
//!
//! These carry a client-safe message only. The mapping to HTTP statuses
//! lives in the error normalizer, never here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Internal(String),
}

/// Parse a path identifier into a record id.
///
/// Only positive integers are accepted; `entity` names the record kind in
/// the error message ("Invalid user ID format").
pub fn parse_id(raw: &str, entity: &str) -> Result<u64, DomainError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| DomainError::InvalidInput(format!("Invalid {entity} ID format")))
}
