//! Administrative maintenance - bulk reset and counter audit.
//!
//! Resets wipe documents together with their counters so numbering restarts from 1.
//! They run in one transaction and are idempotent: a second reset finds nothing left
//! and reports zero deletions. The audit is read-only; it never repairs a counter.

use crate::{
    entities::{Counter, Invoice, Kot, Order, counter, invoice, kot, order},
    errors::Result,
};
use sea_orm::{QuerySelect, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Number of rows removed by a reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    /// Kitchen tickets deleted
    pub kots: u64,
    /// Invoices deleted
    pub invoices: u64,
    /// Orders deleted
    pub orders: u64,
    /// Counters deleted
    pub counters: u64,
}

impl ResetSummary {
    /// Whether the reset found nothing to delete
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kots == 0 && self.invoices == 0 && self.orders == 0 && self.counters == 0
    }
}

/// A scope whose counter is behind the documents already stored for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    /// Scope key shared by the counter and the documents
    pub scope_key: String,
    /// Current counter value, None if the counter row is missing
    pub counter: Option<i64>,
    /// Highest sequence stored on a document in this scope
    pub max_issued: i64,
}

/// Deletes every order, KOT, invoice and counter.
#[instrument(skip(db))]
pub async fn reset_all(db: &DatabaseConnection) -> Result<ResetSummary> {
    let txn = db.begin().await?;

    // Children first: tickets and invoices reference orders.
    let summary = ResetSummary {
        kots: Kot::delete_many().exec(&txn).await?.rows_affected,
        invoices: Invoice::delete_many().exec(&txn).await?.rows_affected,
        orders: Order::delete_many().exec(&txn).await?.rows_affected,
        counters: Counter::delete_many().exec(&txn).await?.rows_affected,
    };

    txn.commit().await?;
    info!("Reset all documents and counters: {:?}", summary);
    Ok(summary)
}

/// Deletes the documents and counters of a single outlet.
#[instrument(skip(db))]
pub async fn reset_outlet(db: &DatabaseConnection, outlet_id: &str) -> Result<ResetSummary> {
    let txn = db.begin().await?;

    let summary = ResetSummary {
        kots: Kot::delete_many()
            .filter(kot::Column::OutletId.eq(outlet_id))
            .exec(&txn)
            .await?
            .rows_affected,
        invoices: Invoice::delete_many()
            .filter(invoice::Column::OutletId.eq(outlet_id))
            .exec(&txn)
            .await?
            .rows_affected,
        orders: Order::delete_many()
            .filter(order::Column::OutletId.eq(outlet_id))
            .exec(&txn)
            .await?
            .rows_affected,
        counters: Counter::delete_many()
            .filter(counter::Column::OutletId.eq(outlet_id))
            .exec(&txn)
            .await?
            .rows_affected,
    };

    txn.commit().await?;
    info!("Reset outlet {}: {:?}", outlet_id, summary);
    Ok(summary)
}

/// Reports scopes where the next allocation would collide with a stored document.
///
/// This happens when a counter is missing or lower than the highest stored sequence,
/// e.g. after counters were wiped without wiping documents, or after importing data.
#[instrument(skip(db))]
pub async fn audit_counters(db: &DatabaseConnection) -> Result<Vec<CounterDrift>> {
    let mut max_issued: BTreeMap<String, i64> = BTreeMap::new();

    let order_maxima: Vec<(String, i64)> = Order::find()
        .select_only()
        .column(order::Column::ScopeKey)
        .column_as(order::Column::Sequence.max(), "max_sequence")
        .group_by(order::Column::ScopeKey)
        .into_tuple()
        .all(db)
        .await?;
    let kot_maxima: Vec<(String, i64)> = Kot::find()
        .select_only()
        .column(kot::Column::ScopeKey)
        .column_as(kot::Column::Sequence.max(), "max_sequence")
        .group_by(kot::Column::ScopeKey)
        .into_tuple()
        .all(db)
        .await?;
    let invoice_maxima: Vec<(String, i64)> = Invoice::find()
        .select_only()
        .column(invoice::Column::ScopeKey)
        .column_as(invoice::Column::Sequence.max(), "max_sequence")
        .group_by(invoice::Column::ScopeKey)
        .into_tuple()
        .all(db)
        .await?;

    for (scope_key, max) in order_maxima
        .into_iter()
        .chain(kot_maxima)
        .chain(invoice_maxima)
    {
        let entry = max_issued.entry(scope_key).or_insert(max);
        *entry = (*entry).max(max);
    }

    let counters: BTreeMap<String, i64> = Counter::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.scope_key, c.count))
        .collect();

    let drifts: Vec<CounterDrift> = max_issued
        .into_iter()
        .filter_map(|(scope_key, max)| {
            let current = counters.get(&scope_key).copied();
            match current {
                Some(count) if count >= max => None,
                _ => Some(CounterDrift {
                    scope_key,
                    counter: current,
                    max_issued: max,
                }),
            }
        })
        .collect();

    if drifts.is_empty() {
        info!("Counter audit found no drift");
    } else {
        warn!("Counter audit found {} drifting scope(s)", drifts.len());
    }
    Ok(drifts)
}
