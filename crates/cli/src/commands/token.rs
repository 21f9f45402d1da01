//! Token minting for operations and manual testing.

use priceworth_api::config::{ConfigError, TokenConfig};
use priceworth_api::services::auth::{ADMIN_SUBJECT_ID, AuthError, TokenKeys};
use priceworth_core::Role;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Issue a token with the configured secret and TTL and print it.
///
/// Admin tokens always carry the operator subject id.
///
/// # Errors
///
/// Returns `TokenError` if the secret is missing or insecure, or signing fails.
pub fn issue(role: Role, id: i32) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let config = TokenConfig::from_env()?;
    let keys = TokenKeys::new(&config);

    let subject = match role {
        Role::Admin => ADMIN_SUBJECT_ID,
        Role::Customer => id,
    };
    let token = keys.issue(subject, role)?;

    tracing::info!(%role, subject, ttl_hours = config.ttl_hours, "Token issued");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
