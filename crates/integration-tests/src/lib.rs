//! Integration test harness for the Priceworth API.
//!
//! Tests drive the real axum router in process with
//! `tower::ServiceExt::oneshot`; no server is started.
//!
//! # Running Tests
//!
//! ```bash
//! # Guard and validation tests (no database needed)
//! cargo test -p priceworth-integration-tests
//!
//! # Full flows against PostgreSQL
//! PRICEWORTH_TEST_DATABASE_URL=postgres://localhost/priceworth_test \
//!     cargo test -p priceworth-integration-tests -- --ignored
//! ```

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use priceworth_api::{
    AppState,
    config::{AdminCredentials, ApiConfig, TokenConfig},
    router,
    services::auth::{TokenKeys, hash_password},
};
use priceworth_core::Role;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;

/// Operator username configured for every test app.
pub const ADMIN_USERNAME: &str = "operator";
/// Operator password matching the configured hash.
pub const ADMIN_PASSWORD: &str = "Operator-Passw0rd!";
/// Origin allowed by the test CORS configuration.
pub const ALLOWED_ORIGIN: &str = "http://localhost:3001";

const TEST_DATABASE_URL_ENV: &str = "PRICEWORTH_TEST_DATABASE_URL";
const UNREACHABLE_DATABASE_URL: &str = "postgres://priceworth@127.0.0.1:1/unreachable";

/// An in-process application and the keys it verifies tokens with.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// An app whose pool never connects until a handler touches it.
    ///
    /// Requests that reach the database fail fast with a 500.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be built.
    #[must_use]
    pub fn without_database() -> Self {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy(UNREACHABLE_DATABASE_URL)
            .expect("lazy pool");
        Self::with_pool(UNREACHABLE_DATABASE_URL, pool)
    }

    /// An app on the database named by `PRICEWORTH_TEST_DATABASE_URL`, with
    /// migrations applied.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset or the database is unreachable.
    pub async fn with_database() -> Self {
        let url = std::env::var(TEST_DATABASE_URL_ENV)
            .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_ENV} must be set"));
        let pool = PgPool::connect(&url).await.expect("test database");
        sqlx::migrate!("../api/migrations")
            .run(&pool)
            .await
            .expect("migrations");
        Self::with_pool(&url, pool)
    }

    fn with_pool(database_url: &str, pool: PgPool) -> Self {
        let state = AppState::new(test_config(database_url), pool);
        Self {
            router: router(state.clone()),
            state,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        self.state.tokens()
    }

    /// A signed admin token.
    ///
    /// # Panics
    ///
    /// Panics if signing fails.
    #[must_use]
    pub fn admin_token(&self) -> String {
        self.tokens().issue(0, Role::Admin).expect("admin token")
    }

    /// A signed customer token for `id`.
    ///
    /// # Panics
    ///
    /// Panics if signing fails.
    #[must_use]
    pub fn customer_token(&self, id: i32) -> String {
        self.tokens()
            .issue(id, Role::Customer)
            .expect("customer token")
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body is not JSON.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }
}

/// Build a request with an optional bearer token and JSON body.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn test_config(database_url: &str) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from(database_url),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        token: TokenConfig {
            secret: SecretString::from("integration-test-signing-key-7f3a9c1e5b2d8046"),
            ttl_hours: 1,
        },
        admin: AdminCredentials {
            username: ADMIN_USERNAME.to_string(),
            password_hash: SecretString::from(
                hash_password(ADMIN_PASSWORD).expect("admin password hash"),
            ),
        },
        cors_origins: vec![ALLOWED_ORIGIN.to_string()],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
