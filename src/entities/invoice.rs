//! Invoice entity - The bill issued for an order.
//!
//! Invoice numbers run for the lifetime of the outlet, so `(outlet_id, invoice_number)`
//! is unique without any date component. An order carries at most one invoice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order being billed
    #[sea_orm(unique)]
    pub order_id: i64,
    /// Outlet issuing the invoice
    pub outlet_id: String,
    /// Display number, e.g. `"042"`
    pub invoice_number: String,
    /// Counter scope the number was allocated from
    pub scope_key: String,
    /// Raw sequence within the scope
    pub sequence: i64,
    /// Billed amount
    pub total_amount: f64,
    /// Payment method label (e.g. `"cash"`, `"upi"`)
    pub payment_method: Option<String>,
    /// When the invoice was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice bills one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
