//! Product and category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::{AppState, error::ApiError};
use crate::core::{
    category,
    product::{self, NewProduct},
};
use crate::entities::{CategoryModel, ProductModel};

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub code: String,
    pub label: String,
}

/// POST /categories
#[tracing::instrument(skip(state, req), fields(code = %req.code))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryModel>), ApiError> {
    let created = state
        .timed(category::create_category(&state.db, &req.code, &req.label))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryModel>>, ApiError> {
    let categories = state.timed(category::list_categories(&state.db)).await?;
    Ok(Json(categories))
}

/// POST /products
#[tracing::instrument(skip(state, req), fields(code = %req.code))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductModel>), ApiError> {
    let created = state
        .timed(product::create_product(&state.db, req))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /products
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ProductModel>>, ApiError> {
    let products = state.timed(product::list_products(&state.db)).await?;
    Ok(Json(products))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductModel>, ApiError> {
    let found = state.timed(product::require_product(&state.db, id)).await?;
    Ok(Json(found))
}
