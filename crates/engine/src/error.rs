//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown on malformed input (non-positive quantity or price,
//!   missing amount, unknown catalog item).
//! - [`Conflict`] thrown when an employee already has an active shift.
//! - [`InvalidState`] thrown when an operation is illegal for the current
//!   shift/transaction status.
//! - [`NotFound`] thrown when an id is unknown.
//! - [`Storage`] thrown when the persistence layer fails.
//!
//! Only [`Storage`] is eligible for a caller-directed retry.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`NotFound`]: EngineError::NotFound
//!  [`Storage`]: EngineError::Storage
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for failures a caller may retry (storage only).
    ///
    /// Writes must carry an idempotency key to be retried safely.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Stable machine-readable label for the error class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::InvalidState(_) => "invalid_state",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_is_retryable() {
        assert!(EngineError::Storage(DbErr::Custom("down".to_string())).is_retryable());
        assert!(!EngineError::Validation("x".to_string()).is_retryable());
        assert!(!EngineError::Conflict("x".to_string()).is_retryable());
        assert!(!EngineError::InvalidState("x".to_string()).is_retryable());
        assert!(!EngineError::NotFound("x".to_string()).is_retryable());
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(EngineError::InvalidState("x".to_string()).kind(), "invalid_state");
        assert_eq!(EngineError::NotFound("x".to_string()).kind(), "not_found");
    }
}
