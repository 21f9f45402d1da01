//! Bearer-token authorization guard.
//!
//! Protected handlers take an [`Authorized<P>`] argument where `P` is a
//! [`RolePolicy`] marker. The extractor verifies the token, checks the role
//! and, for owner-scoped policies, compares the caller id with the `{id}` path
//! parameter. Every failure yields the same `401 Unauthorized` body; the
//! reason is only logged at debug level.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{header::AUTHORIZATION, request::Parts},
};

use priceworth_core::Role;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{Identity, TokenKeys};
use crate::state::AppState;

/// Path parameter compared against the caller id on owner-scoped routes.
const OWNER_PATH_PARAM: &str = "id";

/// Roles a route admits and whether customer access is limited to the
/// customer's own resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub allowed: &'static [Role],
    pub owner_scoped: bool,
}

/// Compile-time route policy.
pub trait RolePolicy {
    const POLICY: Policy;
}

/// Operator-only routes.
#[derive(Debug)]
pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const POLICY: Policy = Policy {
        allowed: &[Role::Admin],
        owner_scoped: false,
    };
}

/// Admin, or the customer whose id is the `{id}` path parameter.
#[derive(Debug)]
pub struct AdminOrOwner;

impl RolePolicy for AdminOrOwner {
    const POLICY: Policy = Policy {
        allowed: &[Role::Admin, Role::Customer],
        owner_scoped: true,
    };
}

/// Any customer; the token identity is the scope.
#[derive(Debug)]
pub struct CustomerSelf;

impl RolePolicy for CustomerSelf {
    const POLICY: Policy = Policy {
        allowed: &[Role::Customer],
        owner_scoped: false,
    };
}

/// Why a request was turned away. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    MissingToken,
    InvalidToken,
    RoleNotAllowed,
    NotOwner,
}

impl GuardRejection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingToken => "missing token",
            Self::InvalidToken => "invalid token",
            Self::RoleNotAllowed => "role not allowed",
            Self::NotOwner => "caller does not own the resource",
        }
    }
}

/// Decide whether a request may proceed.
///
/// `header` is the raw `authorization` value (`Bearer <token>` or a bare
/// token) and `path_id` the `{id}` path parameter, if the route has one.
///
/// # Errors
///
/// Returns the first failing check as a [`GuardRejection`].
pub fn authorize(
    policy: Policy,
    header: Option<&str>,
    path_id: Option<&str>,
    tokens: &TokenKeys,
) -> Result<Identity, GuardRejection> {
    let token = header
        .map(|value| {
            let value = value.trim();
            value.strip_prefix("Bearer ").unwrap_or(value).trim()
        })
        .filter(|token| !token.is_empty())
        .ok_or(GuardRejection::MissingToken)?;

    let identity = tokens
        .verify(token)
        .map(Identity::from)
        .map_err(|_| GuardRejection::InvalidToken)?;

    if !policy.allowed.contains(&identity.role) {
        return Err(GuardRejection::RoleNotAllowed);
    }

    if identity.role == Role::Admin {
        return Ok(identity);
    }

    if policy.owner_scoped && path_id != Some(identity.id.to_string().as_str()) {
        return Err(GuardRejection::NotOwner);
    }

    Ok(identity)
}

/// Extractor that admits a request according to policy `P`.
///
/// # Example
///
/// ```rust,ignore
/// async fn delete_order(
///     _auth: Authorized<AdminOnly>,
///     ApiPath(id): ApiPath<OrderId>,
/// ) -> Result<Json<Order>> { ... }
/// ```
#[derive(Debug)]
pub struct Authorized<P> {
    pub identity: Identity,
    policy: PhantomData<fn() -> P>,
}

impl<P: RolePolicy> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let path_id = if P::POLICY.owner_scoped {
            RawPathParams::from_request_parts(parts, state)
                .await
                .ok()
                .and_then(|params| {
                    params
                        .iter()
                        .find(|(key, _)| *key == OWNER_PATH_PARAM)
                        .map(|(_, value)| value.to_owned())
                })
        } else {
            None
        };

        match authorize(
            P::POLICY,
            header.as_deref(),
            path_id.as_deref(),
            state.tokens(),
        ) {
            Ok(identity) => {
                set_sentry_user(&identity.id, &identity.role.to_string());
                parts.extensions.insert(identity);
                Ok(Self {
                    identity,
                    policy: PhantomData,
                })
            }
            Err(reason) => {
                tracing::debug!(
                    reason = reason.as_str(),
                    path = %parts.uri.path(),
                    "Authorization rejected"
                );
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::TokenConfig;
    use crate::services::auth::ADMIN_SUBJECT_ID;

    fn tokens() -> TokenKeys {
        TokenKeys::new(&TokenConfig {
            secret: SecretString::from("kD9#vL2@pQ7!xR4$mT8^wZ1&nB6*cF3%".to_string()),
            ttl_hours: 1,
        })
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn test_missing_or_blank_header() {
        let keys = tokens();
        assert_eq!(
            authorize(AdminOnly::POLICY, None, None, &keys),
            Err(GuardRejection::MissingToken)
        );
        assert_eq!(
            authorize(AdminOnly::POLICY, Some("   "), None, &keys),
            Err(GuardRejection::MissingToken)
        );
        assert_eq!(
            authorize(AdminOnly::POLICY, Some("Bearer "), None, &keys),
            Err(GuardRejection::MissingToken)
        );
    }

    #[test]
    fn test_invalid_token() {
        let keys = tokens();
        assert_eq!(
            authorize(AdminOnly::POLICY, Some("Bearer abc.def.ghi"), None, &keys),
            Err(GuardRejection::InvalidToken)
        );
    }

    #[test]
    fn test_bearer_and_raw_tokens_accepted() {
        let keys = tokens();
        let token = keys.issue(ADMIN_SUBJECT_ID, Role::Admin).unwrap();

        let identity = authorize(AdminOnly::POLICY, Some(&bearer(&token)), None, &keys).unwrap();
        assert_eq!(identity.role, Role::Admin);

        let identity = authorize(AdminOnly::POLICY, Some(&token), None, &keys).unwrap();
        assert_eq!(identity.id, ADMIN_SUBJECT_ID);
    }

    #[test]
    fn test_customer_rejected_from_admin_route() {
        let keys = tokens();
        let token = keys.issue(5, Role::Customer).unwrap();
        assert_eq!(
            authorize(AdminOnly::POLICY, Some(&bearer(&token)), Some("5"), &keys),
            Err(GuardRejection::RoleNotAllowed)
        );
    }

    #[test]
    fn test_admin_rejected_from_customer_self_route() {
        let keys = tokens();
        let token = keys.issue(ADMIN_SUBJECT_ID, Role::Admin).unwrap();
        assert_eq!(
            authorize(CustomerSelf::POLICY, Some(&bearer(&token)), None, &keys),
            Err(GuardRejection::RoleNotAllowed)
        );
    }

    #[test]
    fn test_admin_passes_owner_scoped_route() {
        let keys = tokens();
        let token = keys.issue(ADMIN_SUBJECT_ID, Role::Admin).unwrap();
        assert!(authorize(AdminOrOwner::POLICY, Some(&bearer(&token)), Some("99"), &keys).is_ok());
        assert!(authorize(AdminOrOwner::POLICY, Some(&bearer(&token)), None, &keys).is_ok());
    }

    #[test]
    fn test_owner_check() {
        let keys = tokens();
        let token = keys.issue(7, Role::Customer).unwrap();
        let header = bearer(&token);

        let identity = authorize(AdminOrOwner::POLICY, Some(&header), Some("7"), &keys).unwrap();
        assert_eq!(identity, Identity { id: 7, role: Role::Customer });

        assert_eq!(
            authorize(AdminOrOwner::POLICY, Some(&header), Some("8"), &keys),
            Err(GuardRejection::NotOwner)
        );
        assert_eq!(
            authorize(AdminOrOwner::POLICY, Some(&header), None, &keys),
            Err(GuardRejection::NotOwner)
        );
        // Ids compare as decimal strings
        assert_eq!(
            authorize(AdminOrOwner::POLICY, Some(&header), Some("007"), &keys),
            Err(GuardRejection::NotOwner)
        );
    }

    #[test]
    fn test_customer_self_ignores_path() {
        let keys = tokens();
        let token = keys.issue(3, Role::Customer).unwrap();
        let identity = authorize(CustomerSelf::POLICY, Some(&bearer(&token)), Some("4"), &keys);
        assert_eq!(identity, Ok(Identity { id: 3, role: Role::Customer }));
    }
}
