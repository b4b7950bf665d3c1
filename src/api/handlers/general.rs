//! Health check.

use crate::api::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

/// Reports liveness and whether the database answers a ping.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "timezone": state.allocator.timezone().name(),
            })),
        ),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "database": e.to_string() })),
            )
        }
    }
}
