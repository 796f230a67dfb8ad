//! Authentication error types.

use thiserror::Error;

use cartwheel_core::{EmailError, UnknownProvider};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("Login incorrect")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password missing or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The requested login strategy is not known or not configured.
    #[error("unknown login strategy: {0}")]
    UnknownStrategy(String),

    /// The provider rejected the exchange or returned an unusable profile.
    #[error("oauth error: {0}")]
    OAuth(String),

    /// Session state missing or invalid (OAuth `state` mismatch).
    #[error("invalid session state")]
    InvalidSessionState,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<UnknownProvider> for AuthError {
    fn from(e: UnknownProvider) -> Self {
        Self::UnknownStrategy(e.0)
    }
}
