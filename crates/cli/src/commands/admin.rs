//! Operator account commands.
//!
//! The operator account is not stored in the database: the server compares
//! logins against `PRICEWORTH_ADMIN_USERNAME` and the argon2 hash in
//! `PRICEWORTH_ADMIN_PASSWORD_HASH`. This command produces that hash.

use priceworth_api::services::auth::{self, AuthError};

/// Hash an operator password and print the PHC string.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 12 {
        tracing::warn!("Operator password is shorter than 12 characters");
    }

    let hash = auth::hash_password(password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}
