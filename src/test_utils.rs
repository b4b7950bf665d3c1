//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating numbered documents with sensible defaults.

use crate::{
    core::{
        NumberAllocator, counter as counter_store,
        numbering::{DocumentKind, Scope},
        invoice::{self, NewInvoice},
        order::{self, LineItem, NewOrder},
    },
    entities::{self, Counter, counter},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectOptions, DatabaseTransaction, TransactionTrait, prelude::*, sea_query::Expr};
use std::{path::Path, time::Duration};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// URL of a file-backed `SQLite` database inside `dir`, created on first connect.
pub fn file_db_url(dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", dir.join("numbering.sqlite").display())
}

/// Connects to a file database with tables initialized.
pub async fn setup_file_db(url: &str) -> Result<DatabaseConnection> {
    let db = crate::config::database::connect(url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Connects without waiting on `SQLite` locks, so a held write lock fails fast with
/// `SQLITE_BUSY` instead of blocking for the driver's default busy timeout.
pub async fn connect_without_busy_wait(url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(|opts| opts.busy_timeout(Duration::ZERO));
    Ok(sea_orm::Database::connect(options).await?)
}

/// Opens a transaction that holds the database write lock until it is committed or
/// dropped.
pub async fn hold_write_lock(db: &DatabaseConnection) -> Result<DatabaseTransaction> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let scope = Scope::new(DocumentKind::Invoice, "lock-holder", now.date_naive());
    counter_store::increment(&txn, &scope, now).await?;
    Ok(txn)
}

/// Allocator with the default business timezone (`Asia/Kolkata`) and a short backoff.
pub fn test_allocator() -> NumberAllocator {
    NumberAllocator::new(chrono_tz::Asia::Kolkata).with_retry(5, Duration::from_millis(5))
}

/// Noon of the given business day in Kolkata, as a UTC instant.
///
/// # Panics
/// Panics on an invalid calendar date.
#[allow(clippy::unwrap_used)]
pub fn business_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Kolkata
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Two plain line items.
pub fn sample_items() -> Vec<LineItem> {
    vec![
        LineItem {
            name: "Masala Dosa".to_string(),
            quantity: 2,
            unit_price: Some(90.0),
            notes: None,
        },
        LineItem {
            name: "Filter Coffee".to_string(),
            quantity: 1,
            unit_price: Some(40.0),
            notes: Some("less sugar".to_string()),
        },
    ]
}

/// Creates an order with [`sample_items`] at `outlet_id`.
pub async fn create_test_order(
    db: &DatabaseConnection,
    allocator: &NumberAllocator,
    outlet_id: &str,
    now: DateTime<Utc>,
) -> Result<entities::order::Model> {
    order::create_order(
        db,
        allocator,
        outlet_id,
        NewOrder {
            table_number: Some("T1".to_string()),
            customer_name: None,
            items: sample_items(),
        },
        now,
    )
    .await
}

/// Bills an order for 220.0 in cash.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    allocator: &NumberAllocator,
    outlet_id: &str,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<entities::invoice::Model> {
    invoice::create_invoice(
        db,
        allocator,
        outlet_id,
        order_id,
        NewInvoice {
            total_amount: 220.0,
            payment_method: Some("cash".to_string()),
        },
        now,
    )
    .await
}

/// Forces a counter to `count`, simulating a stale or mishandled counter.
pub async fn rewind_counter(db: &DatabaseConnection, scope_key: &str, count: i64) -> Result<()> {
    Counter::update_many()
        .col_expr(counter::Column::Count, Expr::value(count))
        .filter(counter::Column::ScopeKey.eq(scope_key))
        .exec(db)
        .await?;
    Ok(())
}
