//! Operator login.
//!
//! The single operator account is configured through the environment; there
//! is no admin table.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};

use priceworth_core::Role;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::models::TokenResponse;
use crate::services::auth::{ADMIN_SUBJECT_ID, verify_admin};
use crate::state::AppState;

/// Admin login request body.
#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// Exchange the operator credentials for an admin token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AdminLogin>,
) -> Result<Json<TokenResponse>> {
    verify_admin(&state.config().admin, &body.username, &body.password)?;

    let token = state.tokens().issue(ADMIN_SUBJECT_ID, Role::Admin)?;
    info!("Admin logged in");
    Ok(Json(TokenResponse { token }))
}
