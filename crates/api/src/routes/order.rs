//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use priceworth_core::{CustomerId, OrderId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminOnly, AdminOrOwner, Authorized};
use crate::models::order::{NewOrder, Order};
use crate::services::OrderService;
use crate::state::AppState;

/// Place a guest order.
#[instrument(skip(state, order))]
pub async fn create_guest(
    State(state): State<AppState>,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.pool()).create(order, None).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state, _auth, order))]
pub async fn create_for_customer(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.pool())
        .create(order, Some(id))
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[instrument(skip(state, _auth))]
pub async fn list(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderService::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, _auth))]
pub async fn list_for_customer(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderService::new(state.pool()).list_for_customer(id).await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn show(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.pool()).get(id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn delete(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode> {
    OrderService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
