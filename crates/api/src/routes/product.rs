//! Product, variant and feature route handlers.
//!
//! Reads are public; every write requires an admin token.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use priceworth_core::{FeatureId, ProductId, VariantId};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminOnly, Authorized};
use crate::models::product::{
    Feature, FeatureUpdate, NewFeature, NewProduct, NewVariant, ProductDetail, ProductUpdate,
    ProductVariant, VariantUpdate,
};
use crate::services::ProductService;
use crate::state::AppState;

// =============================================================================
// Products
// =============================================================================

#[instrument(skip(state, _auth, input))]
pub async fn create(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductDetail>)> {
    let product = ProductService::new(state.pool())
        .create_product(input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductDetail>>> {
    Ok(Json(ProductService::new(state.pool()).list_products().await?))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(ProductService::new(state.pool()).get_product(id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn update(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(
        ProductService::new(state.pool())
            .update_product(id, update)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn delete(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductService::new(state.pool()).delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Variants
// =============================================================================

#[instrument(skip(state, _auth))]
pub async fn create_variant(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiJson(input): ApiJson<NewVariant>,
) -> Result<(StatusCode, Json<ProductVariant>)> {
    let variant = ProductService::new(state.pool())
        .create_variant(input)
        .await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

#[instrument(skip(state, _auth))]
pub async fn update_variant(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<VariantId>,
    ApiJson(update): ApiJson<VariantUpdate>,
) -> Result<Json<ProductVariant>> {
    Ok(Json(
        ProductService::new(state.pool())
            .update_variant(id, update)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn delete_variant(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<VariantId>,
) -> Result<StatusCode> {
    ProductService::new(state.pool()).delete_variant(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Features
// =============================================================================

#[instrument(skip(state, _auth))]
pub async fn create_feature(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiJson(input): ApiJson<NewFeature>,
) -> Result<(StatusCode, Json<Feature>)> {
    let feature = ProductService::new(state.pool())
        .create_feature(input)
        .await?;
    Ok((StatusCode::CREATED, Json(feature)))
}

#[instrument(skip(state, _auth))]
pub async fn update_feature(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<FeatureId>,
    ApiJson(update): ApiJson<FeatureUpdate>,
) -> Result<Json<Feature>> {
    Ok(Json(
        ProductService::new(state.pool())
            .update_feature(id, update)
            .await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn delete_feature(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<FeatureId>,
) -> Result<StatusCode> {
    ProductService::new(state.pool()).delete_feature(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
