//! Order business logic - Creates numbered orders and looks them up.
//!
//! An order receives its number from the allocator only after its payload has been
//! validated, so rejected requests never consume a number. The number is written into
//! the order row once and never recomputed.

use crate::{
    core::{allocator::NumberAllocator, numbering::DocumentKind},
    entities::{Order, order},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Status of an order that can still receive kitchen tickets
pub const STATUS_OPEN: &str = "open";
/// Status of an order that has been invoiced
pub const STATUS_BILLED: &str = "billed";

/// A single ordered item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Menu item name
    pub name: String,
    /// Number of portions, must be positive
    pub quantity: u32,
    /// Price per portion, if known at ordering time
    #[serde(default)]
    pub unit_price: Option<f64>,
    /// Preparation notes ("no onion")
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for a new order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    /// Table label for dine-in orders
    #[serde(default)]
    pub table_number: Option<String>,
    /// Optional customer name
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Items ordered up front (may be empty; tickets add items later)
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Validates line items. Empty lists are only accepted when `allow_empty` is set.
pub(crate) fn validate_items(items: &[LineItem], allow_empty: bool) -> Result<()> {
    if items.is_empty() && !allow_empty {
        return Err(Error::Validation {
            message: "At least one item is required".to_string(),
        });
    }

    for item in items {
        if item.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Item name cannot be empty".to_string(),
            });
        }
        if item.quantity == 0 {
            return Err(Error::Validation {
                message: format!("Quantity for '{}' must be positive", item.name),
            });
        }
        if item
            .unit_price
            .is_some_and(|price| !price.is_finite() || price < 0.0)
        {
            return Err(Error::Validation {
                message: format!("Price for '{}' must be a non-negative amount", item.name),
            });
        }
    }
    Ok(())
}

pub(crate) fn items_to_json(items: &[LineItem]) -> Result<Json> {
    serde_json::to_value(items).map_err(|e| Error::Validation {
        message: format!("Items could not be encoded: {e}"),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates a new order with the next order number of the outlet's business day.
///
/// # Errors
/// * [`Error::Validation`] for malformed items (no number is allocated).
/// * [`Error::InvalidOutlet`] / [`Error::AllocationFailed`] from the allocator.
/// * [`Error::DuplicateNumber`] if the uniqueness constraints reject the number.
#[instrument(skip(db, allocator, new_order))]
pub async fn create_order(
    db: &DatabaseConnection,
    allocator: &NumberAllocator,
    outlet_id: &str,
    new_order: NewOrder,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    validate_items(&new_order.items, true)?;
    let items = items_to_json(&new_order.items)?;

    let issued = allocator
        .allocate(db, DocumentKind::Order, outlet_id, now)
        .await?;

    let order = order::ActiveModel {
        outlet_id: Set(issued.outlet_id.clone()),
        order_number: Set(issued.formatted.clone()),
        scope_key: Set(issued.scope_key.clone()),
        sequence: Set(issued.sequence),
        business_date: Set(issued.business_date),
        table_number: Set(non_blank(new_order.table_number)),
        customer_name: Set(non_blank(new_order.customer_name)),
        items: Set(items),
        status: Set(STATUS_OPEN.to_string()),
        created_at: Set(now),
        ..Default::default()
    };

    let created = order
        .insert(db)
        .await
        .map_err(|e| Error::from_insert(e, outlet_id, &issued.formatted))?;

    info!(
        "Created order {} (id {}) for outlet {}",
        created.order_number, created.id, outlet_id
    );
    Ok(created)
}

/// Fetches an order of the given outlet.
///
/// Orders of other outlets are reported as not found.
pub async fn get_order<C>(db: &C, outlet_id: &str, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .filter(order::Column::OutletId.eq(outlet_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "order",
            id: order_id.to_string(),
        })
}

/// Lists the orders of one business day in number order.
pub async fn list_orders_for_day(
    db: &DatabaseConnection,
    outlet_id: &str,
    business_date: NaiveDate,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::OutletId.eq(outlet_id))
        .filter(order::Column::BusinessDate.eq(business_date))
        .order_by_asc(order::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}
