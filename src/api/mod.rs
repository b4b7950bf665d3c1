//! HTTP layer - axum routes over the core operations
//!
//! This module wires the numbering service to HTTP: document creation for orders,
//! kitchen tickets and invoices, listing endpoints, and the administrative reset and
//! audit. Handlers stay thin; every rule lives in [`crate::core`].

/// Error to HTTP response mapping
pub mod error;
/// Route handlers (documents, admin, health)
pub mod handlers;

use crate::core::NumberAllocator;
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

/// Shared state available to all handlers.
/// Holds the database connection and the configured allocator.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Allocator configured with the business timezone and retry budget
    pub allocator: NumberAllocator,
}

impl AppState {
    /// Creates a new `AppState` from a connection and an allocator.
    #[must_use]
    pub const fn new(database: DatabaseConnection, allocator: NumberAllocator) -> Self {
        Self {
            database,
            allocator,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::general::health))
        .route(
            "/outlets/{outlet_id}/orders",
            post(handlers::orders::create).get(handlers::orders::list),
        )
        .route(
            "/outlets/{outlet_id}/orders/{order_id}/kots",
            post(handlers::kots::create).get(handlers::kots::list_for_order),
        )
        .route(
            "/outlets/{outlet_id}/orders/{order_id}/invoice",
            post(handlers::invoices::create),
        )
        .route("/outlets/{outlet_id}/invoices", get(handlers::invoices::list))
        .route("/admin/reset", post(handlers::admin::reset))
        .route("/admin/counters/audit", get(handlers::admin::audit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
