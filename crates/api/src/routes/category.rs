//! Category route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use priceworth_core::CategoryId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminOnly, Authorized};
use crate::models::category::{Category, CategoryDetail, CategoryInput, CategoryNode};
use crate::services::CategoryService;
use crate::state::AppState;

#[instrument(skip(state, _auth))]
pub async fn create(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CategoryService::new(state.pool()).create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// The category tree.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategoryNode>>> {
    Ok(Json(CategoryService::new(state.pool()).list().await?))
}

#[instrument(skip(state))]
pub async fn list_subcategories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(
        CategoryService::new(state.pool())
            .list_subcategories()
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryDetail>> {
    Ok(Json(CategoryService::new(state.pool()).get(id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn update(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(
        CategoryService::new(state.pool()).update(id, input).await?,
    ))
}

#[instrument(skip(state, _auth))]
pub async fn delete(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CategoryService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
