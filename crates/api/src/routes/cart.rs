//! Cart route handlers.
//!
//! Carts are anonymous until a customer registers on one, so the cart UUID
//! is the only credential the public cart routes require.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use priceworth_core::{CustomerId, ShoppingCartId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminOrOwner, Authorized};
use crate::models::cart::{CartItemRemoval, CartItemRequest, CartView};
use crate::services::CartService;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CartView>)> {
    let cart = CartService::new(state.pool()).create().await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ShoppingCartId>,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).get(id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn for_customer(
    State(state): State<AppState>,
    _auth: Authorized<AdminOrOwner>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<CartView>> {
    Ok(Json(
        CartService::new(state.pool()).get_for_customer(id).await?,
    ))
}

#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CartItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let cart = CartService::new(state.pool()).add_item(request).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CartItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let cart = CartService::new(state.pool()).update_item(request).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// Remove a line; the body names the cart and the variant.
#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CartItemRemoval>,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).delete_item(request).await?))
}
