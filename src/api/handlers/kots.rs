//! Kitchen ticket endpoints.

use crate::{
    api::AppState,
    core::kot::{self, NewKot},
    entities::kot::Model as KotModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

/// `POST /outlets/{outlet_id}/orders/{order_id}/kots`
pub async fn create(
    State(state): State<AppState>,
    Path((outlet_id, order_id)): Path<(String, i64)>,
    Json(payload): Json<NewKot>,
) -> Result<(StatusCode, Json<KotModel>)> {
    let created = kot::create_kot(
        &state.database,
        &state.allocator,
        &outlet_id,
        order_id,
        payload,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /outlets/{outlet_id}/orders/{order_id}/kots`
pub async fn list_for_order(
    State(state): State<AppState>,
    Path((outlet_id, order_id)): Path<(String, i64)>,
) -> Result<Json<Vec<KotModel>>> {
    let kots = kot::list_kots_for_order(&state.database, &outlet_id, order_id).await?;
    Ok(Json(kots))
}
