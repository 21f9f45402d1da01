//! Customer route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use priceworth_core::CustomerId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminOnly, AdminOrOwner, Authorized, CustomerSelf};
use crate::models::customer::{
    ActiveChange, Credentials, Customer, CustomerProfile, PasswordChange, Registration,
    TokenResponse,
};
use crate::services::CustomerService;
use crate::state::AppState;

/// Register a customer on an anonymous cart.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let token = CustomerService::new(state.pool(), state.tokens())
        .register(registration)
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<TokenResponse>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .login(credentials)
            .await?,
    ))
}

/// The customer behind the bearer token.
#[instrument(skip(state))]
pub async fn current(
    State(state): State<AppState>,
    auth: Authorized<CustomerSelf>,
) -> Result<Json<Customer>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .get_current(auth.identity)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn show(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<Customer>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .get(id)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn update_info(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(profile): ApiJson<CustomerProfile>,
) -> Result<Json<Customer>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .update_info(id, profile)
            .await?,
    ))
}

#[instrument(skip(state, _auth, change))]
pub async fn update_password(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<Json<Customer>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .update_password(id, change)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn update_active(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(change): ApiJson<ActiveChange>,
) -> Result<Json<Customer>> {
    Ok(Json(
        CustomerService::new(state.pool(), state.tokens())
            .update_active(id, change)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn delete(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<StatusCode> {
    CustomerService::new(state.pool(), state.tokens())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
