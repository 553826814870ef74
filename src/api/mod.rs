//! HTTP JSON layer over the order workflow.
//!
//! Handlers decode the request, call into [`crate::core`] under the request
//! timeout and map errors through [`error::ApiError`].

pub mod auth;
pub mod error;
pub mod routes;

use crate::{
    config::Isolation,
    core::{status::Statuses, uow::UnitOfWork},
    errors::{Error, Result},
};
use axum::Router;
use axum::routing::{delete, get, post};
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers, held behind an `Arc`.
pub struct AppState {
    pub db: DatabaseConnection,
    pub statuses: Statuses,
    pub isolation: Isolation,
    pub request_timeout: Duration,
}

impl AppState {
    /// A fresh unit of work at the configured isolation.
    #[must_use]
    pub const fn uow(&self) -> UnitOfWork<'_> {
        UnitOfWork::new(&self.db).with_isolation(self.isolation)
    }

    /// Runs `work` under the request timeout.
    ///
    /// On expiry the future is dropped, and with it any open transaction, which
    /// the store then rolls back.
    pub async fn timed<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.request_timeout, work)
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.request_timeout, "request timed out");
                Error::Timeout
            })?
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/persons", post(routes::persons::create))
        .route(
            "/persons/{id}",
            get(routes::persons::get).delete(routes::persons::remove),
        )
        .route(
            "/categories",
            post(routes::products::create_category).get(routes::products::list_categories),
        )
        .route(
            "/products",
            post(routes::products::create).get(routes::products::list),
        )
        .route("/products/{id}", get(routes::products::get))
        .route(
            "/clients/{client_id}/cart",
            post(routes::carts::create).get(routes::carts::get),
        )
        .route("/clients/{client_id}/cart/items", post(routes::carts::add_item))
        .route(
            "/cart-items/{id}",
            delete(routes::carts::remove_item).patch(routes::carts::update_item),
        )
        .route("/cart-items/{id}/purge", delete(routes::carts::purge_item))
        .route(
            "/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get).delete(routes::orders::remove),
        )
        .route("/orders/{id}/status", post(routes::orders::change_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
