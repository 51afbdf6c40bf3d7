//! Product service error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::product::ValidationError;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// No product with the requested ID exists.
    #[error("product not found")]
    NotFound,

    /// The product belongs to another user.
    #[error("product belongs to another user")]
    Forbidden,

    /// Submitted fields failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
