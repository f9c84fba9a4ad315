//! Workflow error taxonomy.

use thiserror::Error;

use little_lemon_core::Denial;

use crate::db::RepositoryError;

/// Errors returned by the ordering workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The caller must log in first.
    #[error("authentication credentials were not provided")]
    Unauthenticated,

    /// The caller's role does not allow this action.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// An order was requested from an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The target does not exist, or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The change would violate a uniqueness or reference rule.
    #[error("{0}")]
    Conflict(String),

    /// Store failure.
    #[error("store error: {0}")]
    Repository(#[source] RepositoryError),
}

impl ServiceError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl ToString) -> Self {
        Self::Validation(message.to_string())
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::NotFound => Self::NotFound("resource"),
            other => Self::Repository(other),
        }
    }
}
