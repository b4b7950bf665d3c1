//! Invoice business logic - Bills orders with outlet-lifetime invoice numbers.
//!
//! Invoice numbers never restart: the scope is the outlet alone. Issuing an invoice and
//! marking its order as billed happen in one database transaction; the number itself is
//! allocated beforehand and is skipped if that transaction fails.

use crate::{
    core::{allocator::NumberAllocator, numbering::DocumentKind, order},
    entities::{Invoice, Order, invoice, order as order_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Payload for billing an order
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    /// Amount billed
    pub total_amount: f64,
    /// Payment method label
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Issues the invoice for an order and marks the order billed.
///
/// # Errors
/// * [`Error::Validation`] if the amount is negative or not finite.
/// * [`Error::NotFound`] if the order does not exist for this outlet.
/// * [`Error::InvoiceExists`] if the order was already invoiced.
/// * Allocation and uniqueness errors as for orders.
#[instrument(skip(db, allocator, new_invoice))]
pub async fn create_invoice(
    db: &DatabaseConnection,
    allocator: &NumberAllocator,
    outlet_id: &str,
    order_id: i64,
    new_invoice: NewInvoice,
    now: DateTime<Utc>,
) -> Result<invoice::Model> {
    if !new_invoice.total_amount.is_finite() || new_invoice.total_amount < 0.0 {
        return Err(Error::Validation {
            message: format!(
                "Invoice total must be a non-negative amount, got {}",
                new_invoice.total_amount
            ),
        });
    }

    let parent = order::get_order(db, outlet_id, order_id).await?;
    if let Some(existing) = get_invoice_for_order(db, parent.id).await? {
        return Err(Error::InvoiceExists {
            order_id,
            invoice_number: existing.invoice_number,
        });
    }

    let issued = allocator
        .allocate(db, DocumentKind::Invoice, outlet_id, now)
        .await?;

    let txn = db.begin().await?;

    let bill = invoice::ActiveModel {
        order_id: Set(parent.id),
        outlet_id: Set(issued.outlet_id.clone()),
        invoice_number: Set(issued.formatted.clone()),
        scope_key: Set(issued.scope_key.clone()),
        sequence: Set(issued.sequence),
        total_amount: Set(new_invoice.total_amount),
        payment_method: Set(new_invoice.payment_method.filter(|m| !m.trim().is_empty())),
        created_at: Set(now),
        ..Default::default()
    };

    let created = match bill.insert(&txn).await {
        Ok(created) => created,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(
                    "Rollback after failed invoice insert for order {} failed: {}",
                    order_id, rollback_err
                );
            }
            // A concurrent request may have billed the same order in the meantime.
            if let Some(existing) = get_invoice_for_order(db, parent.id).await? {
                return Err(Error::InvoiceExists {
                    order_id,
                    invoice_number: existing.invoice_number,
                });
            }
            return Err(Error::from_insert(err, outlet_id, &issued.formatted));
        }
    };

    Order::update_many()
        .col_expr(
            order_entity::Column::Status,
            Expr::value(order::STATUS_BILLED),
        )
        .filter(order_entity::Column::Id.eq(parent.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        "Issued invoice {} for order {} at outlet {}",
        created.invoice_number, parent.order_number, outlet_id
    );
    Ok(created)
}

/// Returns the invoice of an order, if one was issued.
pub async fn get_invoice_for_order<C>(db: &C, order_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::OrderId.eq(order_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists an outlet's invoices in number order.
pub async fn list_invoices(db: &DatabaseConnection, outlet_id: &str) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::OutletId.eq(outlet_id))
        .order_by_asc(invoice::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_invoice_numbers_run_across_days() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let day_one = business_noon(2025, 6, 15);
        let day_two = business_noon(2025, 6, 16);

        let first_order = create_test_order(&db, &allocator, "outlet1", day_one).await?;
        let second_order = create_test_order(&db, &allocator, "outlet1", day_two).await?;

        let first = create_test_invoice(&db, &allocator, "outlet1", first_order.id, day_one).await?;
        let second = create_test_invoice(&db, &allocator, "outlet1", second_order.id, day_two).await?;

        assert_eq!(first.invoice_number, "001");
        assert_eq!(second.invoice_number, "002");
        assert_eq!(second.scope_key, "invoice_outlet1");

        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_marks_order_billed() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;

        let bill = create_invoice(
            &db,
            &allocator,
            "outlet1",
            order.id,
            NewInvoice {
                total_amount: 480.5,
                payment_method: Some("upi".to_string()),
            },
            now,
        )
        .await?;
        assert_eq!(bill.total_amount, 480.5);
        assert_eq!(bill.payment_method.as_deref(), Some("upi"));

        let reloaded = order::get_order(&db, "outlet1", order.id).await?;
        assert_eq!(reloaded.status, order::STATUS_BILLED);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_invoice_for_order_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;
        create_test_invoice(&db, &allocator, "outlet1", order.id, now).await?;

        let again = create_test_invoice(&db, &allocator, "outlet1", order.id, now).await;
        assert!(matches!(
            again,
            Err(Error::InvoiceExists { ref invoice_number, .. }) if invoice_number == "001"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_amount_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;

        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let result = create_invoice(
                &db,
                &allocator,
                "outlet1",
                order.id,
                NewInvoice {
                    total_amount: amount,
                    payment_method: None,
                },
                now,
            )
            .await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }

        let bill = create_test_invoice(&db, &allocator, "outlet1", order.id, now).await?;
        assert_eq!(bill.sequence, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number_rejected_by_store() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let first_order = create_test_order(&db, &allocator, "outlet1", now).await?;
        let second_order = create_test_order(&db, &allocator, "outlet1", now).await?;
        create_test_invoice(&db, &allocator, "outlet1", first_order.id, now).await?;

        rewind_counter(&db, "invoice_outlet1", 0).await?;

        let result = create_test_invoice(&db, &allocator, "outlet1", second_order.id, now).await;
        assert!(matches!(result, Err(Error::DuplicateNumber { .. })));

        // The failed attempt left the order open.
        let reloaded = order::get_order(&db, "outlet1", second_order.id).await?;
        assert_eq!(reloaded.status, order::STATUS_OPEN);

        let retried = create_test_invoice(&db, &allocator, "outlet1", second_order.id, now).await?;
        assert_eq!(retried.invoice_number, "002");

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_error_survives_failed_rollback() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let db = setup_file_db(&file_db_url(dir.path())).await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;

        // RAISE(ROLLBACK) ends the transaction inside SQLite, so the explicit rollback
        // that follows the failed insert has nothing left to roll back.
        db.execute_unprepared(
            "CREATE TRIGGER reject_invoices BEFORE INSERT ON invoices \
             BEGIN SELECT RAISE(ROLLBACK, 'invoice rejected'); END",
        )
        .await?;

        let result = create_test_invoice(&db, &allocator, "outlet1", order.id, now).await;
        match result {
            Err(Error::Database(err)) => {
                assert!(err.to_string().contains("invoice rejected"), "{err}");
            }
            other => panic!("expected the insert error, got {other:?}"),
        }

        let reloaded = order::get_order(&db, "outlet1", order.id).await?;
        assert_eq!(reloaded.status, order::STATUS_OPEN);
        assert!(get_invoice_for_order(&db, order.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_invoices() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        for outlet in ["outlet1", "outlet1", "outlet2"] {
            let order = create_test_order(&db, &allocator, outlet, now).await?;
            create_test_invoice(&db, &allocator, outlet, order.id, now).await?;
        }

        let invoices = list_invoices(&db, "outlet1").await?;
        let numbers: Vec<_> = invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["001", "002"]);

        Ok(())
    }
}
