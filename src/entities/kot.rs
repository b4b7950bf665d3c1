//! KOT entity - Kitchen order ticket raised against an order.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kitchen order ticket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kots")]
pub struct Model {
    /// Unique identifier for the ticket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this ticket was raised for
    pub order_id: i64,
    /// Outlet whose kitchen receives the ticket
    pub outlet_id: String,
    /// Display number, e.g. `"001"`
    pub kot_number: String,
    /// Counter scope the number was allocated from
    pub scope_key: String,
    /// Raw sequence within the scope
    pub sequence: i64,
    /// Business day the ticket belongs to
    pub business_date: Date,
    /// Items sent to the kitchen as a JSON array
    pub items: Json,
    /// Free-form kitchen notes
    pub notes: Option<String>,
    /// When the ticket was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Kot and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each ticket belongs to one order
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
