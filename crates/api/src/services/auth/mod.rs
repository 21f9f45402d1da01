//! Authentication service.
//!
//! Issues and verifies HS256 bearer tokens carrying `{id, role}`, hashes
//! customer passwords with Argon2id, and checks the operator login against
//! the configured admin credentials.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use priceworth_core::Role;

use crate::config::{AdminCredentials, TokenConfig};

/// Subject id carried by admin tokens. The admin is not a database row.
pub const ADMIN_SUBJECT_ID: i32 = 0;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, as decoded from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
        }
    }
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Build keys from the token configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(config.ttl_hours),
        }
    }

    /// Sign a token for the given subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, id: i32, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Check operator credentials against the configured admin account.
///
/// # Errors
///
/// Returns `AuthError::InvalidAdminCredentials` if either the username or
/// the password is wrong.
pub fn verify_admin(
    admin: &AdminCredentials,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    // Hash check runs on every attempt, known username or not
    let password_ok = verify_password(password, admin.password_hash.expose_secret()).is_ok();

    if username != admin.username || !password_ok {
        return Err(AuthError::InvalidAdminCredentials);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` if the password is wrong or the
/// stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordMismatch)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::PasswordMismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&TokenConfig {
            secret: SecretString::from(secret.to_string()),
            ttl_hours: 1,
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%");
        let token = keys.issue(42, Role::Customer).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.exp - claims.iat, 3600);

        let identity = Identity::from(claims);
        assert_eq!(identity, Identity { id: 42, role: Role::Customer });
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = keys("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%")
            .issue(ADMIN_SUBJECT_ID, Role::Admin)
            .unwrap();
        let other = keys("Yh5&uJ8*iK1(oL4)pA7!sD0@fG3#hJ6$");

        assert!(matches!(other.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let keys = keys("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%");
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            id: 1,
            role: Role::Customer,
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let keys = keys("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%");
        assert!(keys.verify("not-a-token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn test_debug_hides_keys() {
        let keys = keys("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%");
        let debug = format!("{keys:?}");
        assert!(debug.contains("ttl_hours"));
        assert!(!debug.contains("kD9#"));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Sup3r$ecret", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(verify_password("Sup3r$ecret", "not-a-hash").is_err());
    }

    #[test]
    fn test_verify_admin() {
        let admin = AdminCredentials {
            username: "operator".to_string(),
            password_hash: SecretString::from(hash_password("0perator!Pass").unwrap()),
        };

        assert!(verify_admin(&admin, "operator", "0perator!Pass").is_ok());
        assert!(matches!(
            verify_admin(&admin, "operator", "nope"),
            Err(AuthError::InvalidAdminCredentials)
        ));
        assert!(matches!(
            verify_admin(&admin, "someone", "0perator!Pass"),
            Err(AuthError::InvalidAdminCredentials)
        ));
    }
}
