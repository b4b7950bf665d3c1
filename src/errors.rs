//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Store errors coming out of
//! `SeaORM` convert automatically; the numbering-specific variants carry enough context
//! (scope key, outlet, formatted number) to be logged and reported without re-deriving it.

use sea_orm::DbErr;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any backing-store error not covered by a more specific variant
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem or socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The outlet identifier cannot be used to build a scope key
    #[error("Invalid outlet id: {outlet_id:?}")]
    InvalidOutlet {
        /// The rejected identifier
        outlet_id: String,
    },

    /// Request payload failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// What failed
        message: String,
    },

    /// A referenced record does not exist (or belongs to another outlet)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (e.g. `"order"`)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The order has already been billed and accepts no more tickets
    #[error("Order {order_id} is closed (status: {status})")]
    OrderClosed {
        /// Order primary key
        order_id: i64,
        /// Current order status
        status: String,
    },

    /// An invoice was already issued for the order
    #[error("Order {order_id} already has invoice {invoice_number}")]
    InvoiceExists {
        /// Order primary key
        order_id: i64,
        /// Number of the existing invoice
        invoice_number: String,
    },

    /// The counter could not be incremented; no number was issued
    #[error("Allocation failed for {scope_key} after {attempts} attempt(s): {reason}")]
    AllocationFailed {
        /// Scope whose counter was being incremented
        scope_key: String,
        /// Attempts made before giving up
        attempts: u32,
        /// Last store error
        reason: String,
    },

    /// A uniqueness constraint rejected a freshly numbered document
    #[error("Duplicate document number {number} for outlet {outlet_id}")]
    DuplicateNumber {
        /// Outlet the document belongs to
        outlet_id: String,
        /// The rejected display number
        number: String,
    },
}

impl Error {
    /// Maps an insert failure into [`Error::DuplicateNumber`] when the store reports a
    /// uniqueness violation, and into [`Error::Database`] otherwise.
    pub(crate) fn from_insert(err: DbErr, outlet_id: &str, number: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::error!(
                    "Uniqueness constraint rejected {} for outlet {}: {}",
                    number,
                    outlet_id,
                    detail
                );
                Self::DuplicateNumber {
                    outlet_id: outlet_id.to_string(),
                    number: number.to_string(),
                }
            }
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
