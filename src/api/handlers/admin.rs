//! Administrative endpoints: reset and counter audit.
//!
//! Access control is left to the deployment (reverse proxy or network policy).

use crate::{
    api::AppState,
    core::maintenance::{self, CounterDrift, ResetSummary},
    errors::Result,
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

/// Optional outlet filter for resets
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    /// Restrict the reset to one outlet
    pub outlet_id: Option<String>,
}

/// `POST /admin/reset[?outlet_id=...]`
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ResetSummary>> {
    let summary = match query.outlet_id {
        Some(outlet_id) => maintenance::reset_outlet(&state.database, &outlet_id).await?,
        None => maintenance::reset_all(&state.database).await?,
    };
    Ok(Json(summary))
}

/// `GET /admin/counters/audit`
pub async fn audit(State(state): State<AppState>) -> Result<Json<Vec<CounterDrift>>> {
    let drifts = maintenance::audit_counters(&state.database).await?;
    Ok(Json(drifts))
}
