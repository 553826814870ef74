//! Cart and cart item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::{AppState, error::ApiError};
use crate::core::cart::{self, CartView};
use crate::entities::{CartItemModel, CartModel};

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// POST /clients/{client_id}/cart
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<(StatusCode, Json<CartModel>), ApiError> {
    let created = state.timed(cart::create_cart(&state.db, client_id)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /clients/{client_id}/cart
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<Json<CartView>, ApiError> {
    let view = state
        .timed(cart::get_cart_with_items(&state.db, client_id))
        .await?;
    Ok(Json(view))
}

/// POST /clients/{client_id}/cart/items - AddToCart.
#[tracing::instrument(skip(state, req), fields(product_id = req.product_id, quantity = req.quantity))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItemModel>), ApiError> {
    let item = state
        .timed(cart::add_item(
            state.uow(),
            &state.statuses,
            client_id,
            req.product_id,
            req.quantity,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /cart-items/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartItemModel>, ApiError> {
    let item = state
        .timed(cart::update_item_quantity(
            state.uow(),
            &state.statuses,
            id,
            req.quantity,
        ))
        .await?;
    Ok(Json(item))
}

/// DELETE /cart-items/{id} - takes the line out of the cart (`Cancelled`).
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CartItemModel>, ApiError> {
    let item = state
        .timed(cart::remove_item(state.uow(), &state.statuses, id))
        .await?;
    Ok(Json(item))
}

/// DELETE /cart-items/{id}/purge - deletes the row; refused while an open order holds it.
#[tracing::instrument(skip(state))]
pub async fn purge_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .timed(cart::delete_cart_item(state.uow(), &state.statuses, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
