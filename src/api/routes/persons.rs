//! Person endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::{AppState, error::ApiError};
use crate::core::person;
use crate::entities::PersonModel;

#[derive(Deserialize)]
pub struct CreatePersonRequest {
    pub user_login: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /persons
#[tracing::instrument(skip(state, req), fields(user_login = %req.user_login))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<PersonModel>), ApiError> {
    let created = state
        .timed(person::create_person(
            &state.db,
            &req.user_login,
            &req.first_name,
            &req.last_name,
            req.email.as_deref(),
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /persons/{id} - soft-deleted persons are not found.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PersonModel>, ApiError> {
    let found = state
        .timed(person::require_active_person(&state.db, id))
        .await?;
    Ok(Json(found))
}

/// DELETE /persons/{id} - soft delete.
#[tracing::instrument(skip(state))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .timed(person::soft_delete_person(&state.db, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
