//! Order endpoints.

use crate::{
    api::AppState,
    core::order::{self, NewOrder},
    entities::order::Model as OrderModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

/// Optional business-day filter
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// Business day as `YYYY-MM-DD`; today in the business timezone when absent
    pub date: Option<NaiveDate>,
}

/// `POST /outlets/{outlet_id}/orders`
pub async fn create(
    State(state): State<AppState>,
    Path(outlet_id): Path<String>,
    Json(payload): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderModel>)> {
    let created = order::create_order(
        &state.database,
        &state.allocator,
        &outlet_id,
        payload,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /outlets/{outlet_id}/orders?date=YYYY-MM-DD`
pub async fn list(
    State(state): State<AppState>,
    Path(outlet_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<OrderModel>>> {
    let day = query
        .date
        .unwrap_or_else(|| state.allocator.business_date(Utc::now()));
    let orders = order::list_orders_for_day(&state.database, &outlet_id, day).await?;
    Ok(Json(orders))
}
