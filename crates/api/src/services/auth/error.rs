//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] priceworth_core::EmailError),

    /// No customer is registered under the email.
    #[error("email not registered")]
    UnknownEmail,

    /// Password does not match the stored hash.
    #[error("password does not match")]
    PasswordMismatch,

    /// The account has been deactivated.
    #[error("account is inactive")]
    Inactive,

    /// Operator credentials did not match the configured admin.
    #[error("invalid admin credentials")]
    InvalidAdminCredentials,

    /// Password does not meet the strength policy.
    #[error("weak password: {0}")]
    WeakPassword(#[from] priceworth_core::PasswordError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed or failed verification.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
