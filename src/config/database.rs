//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`;
//! the composite uniqueness constraints that back document numbering are added as named
//! indexes. Every statement is `IF NOT EXISTS`, so several processes sharing one database
//! file can all run [`create_tables`] at startup.

use crate::entities::{Counter, Invoice, InvoiceColumn, Kot, KotColumn, Order, OrderColumn};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/outlet_numbering.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the given database URL.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    Database::connect(options).await.map_err(Into::into)
}

/// Establishes a connection using `DATABASE_URL`, falling back to a local `SQLite` file.
///
/// The parent directory of a file-backed `SQLite` database is created if missing.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    connect(&database_url).await
}

fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates all tables and uniqueness indexes if they do not exist yet.
///
/// Documents are protected by two unique indexes each: one on the display number within
/// its natural scope (outlet + business day for orders and tickets, outlet alone for
/// invoices) and one on `(scope_key, sequence)`.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut counter_table = schema.create_table_from_entity(Counter);
    let mut order_table = schema.create_table_from_entity(Order);
    let mut kot_table = schema.create_table_from_entity(Kot);
    let mut invoice_table = schema.create_table_from_entity(Invoice);

    for table in [
        &mut counter_table,
        &mut order_table,
        &mut kot_table,
        &mut invoice_table,
    ] {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables and unique indexes ensured.");
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_orders_outlet_day_number")
            .table(Order)
            .col(OrderColumn::OutletId)
            .col(OrderColumn::BusinessDate)
            .col(OrderColumn::OrderNumber)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_orders_scope_sequence")
            .table(Order)
            .col(OrderColumn::ScopeKey)
            .col(OrderColumn::Sequence)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_kots_outlet_day_number")
            .table(Kot)
            .col(KotColumn::OutletId)
            .col(KotColumn::BusinessDate)
            .col(KotColumn::KotNumber)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_kots_scope_sequence")
            .table(Kot)
            .col(KotColumn::ScopeKey)
            .col(KotColumn::Sequence)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_invoices_outlet_number")
            .table(Invoice)
            .col(InvoiceColumn::OutletId)
            .col(InvoiceColumn::InvoiceNumber)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_invoices_scope_sequence")
            .table(Invoice)
            .col(InvoiceColumn::ScopeKey)
            .col(InvoiceColumn::Sequence)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CounterModel, InvoiceModel, KotModel, OrderModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<CounterModel> = Counter::find().limit(1).all(&db).await?;
        let _: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;
        let _: Vec<KotModel> = Kot::find().limit(1).all(&db).await?;
        let _: Vec<InvoiceModel> = Invoice::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<CounterModel> = Counter::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_database_url_has_default() {
        assert!(!get_database_url().is_empty());
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/pos.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://pos.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_parent_dir("postgres://localhost/pos"), None);
    }
}
