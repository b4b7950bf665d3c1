//! Counter entity - One row per numbering scope.
//!
//! The `scope_key` is the persisted identity of a scope (`order_<outlet>_<YYYY-MM-DD>`,
//! `kot_<outlet>_<YYYY-MM-DD>` or `invoice_<outlet>`). `count` is the highest sequence
//! issued so far and only ever moves through the atomic increment in `core::counter`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    /// Rendered scope key, unique per scope
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope_key: String,
    /// Document kind: `"order"`, `"kot"` or `"invoice"`
    pub kind: String,
    /// Outlet the scope belongs to
    pub outlet_id: String,
    /// Business day for day-scoped kinds, None for invoices
    pub business_date: Option<Date>,
    /// Highest sequence number issued in this scope
    pub count: i64,
    /// When the counter was last incremented
    pub updated_at: DateTimeUtc,
}

/// Counters are standalone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
