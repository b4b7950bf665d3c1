//! Invoice endpoints.

use crate::{
    api::AppState,
    core::invoice::{self, NewInvoice},
    entities::invoice::Model as InvoiceModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

/// `POST /outlets/{outlet_id}/orders/{order_id}/invoice`
pub async fn create(
    State(state): State<AppState>,
    Path((outlet_id, order_id)): Path<(String, i64)>,
    Json(payload): Json<NewInvoice>,
) -> Result<(StatusCode, Json<InvoiceModel>)> {
    let created = invoice::create_invoice(
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

/// `GET /outlets/{outlet_id}/invoices`
pub async fn list(
    State(state): State<AppState>,
    Path(outlet_id): Path<String>,
) -> Result<Json<Vec<InvoiceModel>>> {
    let invoices = invoice::list_invoices(&state.database, &outlet_id).await?;
    Ok(Json(invoices))
}
