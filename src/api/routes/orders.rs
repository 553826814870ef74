//! Order endpoints: assembly, manager decisions and queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::{AppState, auth::Manager, error::ApiError};
use crate::core::{
    order::{self, OrderDetails, OrderFilter},
    status::OrderStatus,
};
use crate::entities::OrderModel;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: i64,
    pub cart_item_ids: Vec<i64>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

/// POST /orders - CreateOrder.
#[tracing::instrument(skip(state, req), fields(client_id = req.client_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderModel>), ApiError> {
    let created = state
        .timed(order::create_order(
            state.uow(),
            &state.statuses,
            req.client_id,
            req.cart_item_ids,
            req.details,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /orders/{id} - the order with its items.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetails>, ApiError> {
    let details = state
        .timed(order::get_order_with_items(&state.db, &state.statuses, id))
        .await?;
    Ok(Json(details))
}

/// GET /orders?client_id=&manager_id=&status=
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderModel>>, ApiError> {
    let orders = state
        .timed(order::list_orders(&state.db, &state.statuses, filter))
        .await?;
    Ok(Json(orders))
}

/// POST /orders/{id}/status - ChangeOrderStatus, managers only.
#[tracing::instrument(skip(state, manager, req), fields(manager_id = manager.id, target = %req.status))]
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    manager: Manager,
    Path(id): Path<i64>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<OrderModel>, ApiError> {
    let updated = state
        .timed(order::change_order_status(
            state.uow(),
            &state.statuses,
            id,
            manager.id,
            req.status,
        ))
        .await?;
    Ok(Json(updated))
}

/// DELETE /orders/{id} - managers only, decided orders only.
#[tracing::instrument(skip(state, manager), fields(manager_id = manager.id))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    manager: Manager,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .timed(order::delete_order(state.uow(), &state.statuses, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
