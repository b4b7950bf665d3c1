//! Order entity - A customer order with its allocated order number.
//!
//! `order_number` is rendered once at creation (`NNN/YY-YY`) and stored as-is.
//! `scope_key` and `sequence` record where that number came from so the uniqueness
//! index on `(scope_key, sequence)` can catch a counter that went backwards.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Outlet that took the order
    pub outlet_id: String,
    /// Display number, e.g. `"007/25-26"`
    pub order_number: String,
    /// Counter scope the number was allocated from
    pub scope_key: String,
    /// Raw sequence within the scope
    pub sequence: i64,
    /// Business day the order belongs to
    pub business_date: Date,
    /// Table label for dine-in orders
    pub table_number: Option<String>,
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Ordered line items as a JSON array
    pub items: Json,
    /// `"open"` until invoiced, then `"billed"`
    pub status: String,
    /// When the order was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many kitchen tickets
    #[sea_orm(has_many = "super::kot::Entity")]
    Kots,
    /// One order has at most one invoice
    #[sea_orm(has_one = "super::invoice::Entity")]
    Invoice,
}

impl Related<super::kot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Kots.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
