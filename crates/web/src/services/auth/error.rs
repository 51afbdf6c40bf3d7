//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The username is already registered.
    #[error("username already exists")]
    DuplicateUsername,

    /// The email is already registered.
    #[error("email already exists")]
    DuplicateEmail,

    /// Wrong password or unknown user (deliberately indistinguishable).
    #[error("invalid credentials")]
    AuthenticationFailed,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<cellarbook_core::UsernameError> for AuthError {
    fn from(err: cellarbook_core::UsernameError) -> Self {
        Self::Validation(capitalize(&err.to_string()))
    }
}

impl From<cellarbook_core::EmailError> for AuthError {
    fn from(err: cellarbook_core::EmailError) -> Self {
        Self::Validation(capitalize(&err.to_string()))
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
