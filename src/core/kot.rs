//! Kitchen order ticket logic - Raises numbered KOTs against open orders.
//!
//! KOT numbers restart every business day per outlet. A ticket can only be raised for an
//! order that belongs to the same outlet and has not been billed yet.

use crate::{
    core::{
        allocator::{IssuedNumber, NumberAllocator},
        numbering::DocumentKind,
        order::{self, LineItem},
    },
    entities::{Kot, Order, kot, order as order_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    FromQueryResult, QueryOrder,
    prelude::*,
    sea_query::{Query, SimpleExpr},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Payload for a new kitchen ticket
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewKot {
    /// Items to prepare, at least one
    pub items: Vec<LineItem>,
    /// Free-form notes for the kitchen
    #[serde(default)]
    pub notes: Option<String>,
}

/// Creates a kitchen ticket for an open order.
///
/// # Errors
/// * [`Error::Validation`] for an empty or malformed item list.
/// * [`Error::NotFound`] if the order does not exist for this outlet.
/// * [`Error::OrderClosed`] if the order was already billed.
/// * Allocation and uniqueness errors as for orders.
#[instrument(skip(db, allocator, new_kot))]
pub async fn create_kot(
    db: &DatabaseConnection,
    allocator: &NumberAllocator,
    outlet_id: &str,
    order_id: i64,
    new_kot: NewKot,
    now: DateTime<Utc>,
) -> Result<kot::Model> {
    order::validate_items(&new_kot.items, false)?;
    let items = order::items_to_json(&new_kot.items)?;

    let parent = order::get_order(db, outlet_id, order_id).await?;
    if parent.status != order::STATUS_OPEN {
        return Err(Error::OrderClosed {
            order_id,
            status: parent.status,
        });
    }

    let issued = allocator
        .allocate(db, DocumentKind::Kot, outlet_id, now)
        .await?;

    let notes = new_kot.notes.filter(|n| !n.trim().is_empty());
    let Some(created) = insert_while_open(db, parent.id, &issued, items, notes, now).await? else {
        // Billed between the status check above and the insert.
        let current = order::get_order(db, outlet_id, order_id).await?;
        warn!(
            "Order {} was billed before KOT {} could be raised; number skipped",
            parent.order_number, issued.formatted
        );
        return Err(Error::OrderClosed {
            order_id,
            status: current.status,
        });
    };

    info!(
        "Created KOT {} for order {} at outlet {}",
        created.kot_number, parent.order_number, outlet_id
    );
    Ok(created)
}

/// Inserts a ticket in a single `INSERT ... SELECT` that only matches while the order is
/// still open, so a concurrent billing can never leave a ticket on a billed order.
///
/// Returns `None` when the order is no longer open.
async fn insert_while_open<C>(
    db: &C,
    order_id: i64,
    issued: &IssuedNumber,
    items: Json,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<Option<kot::Model>>
where
    C: ConnectionTrait,
{
    let values: [SimpleExpr; 9] = [
        order_id.into(),
        issued.outlet_id.clone().into(),
        issued.formatted.clone().into(),
        issued.scope_key.clone().into(),
        issued.sequence.into(),
        issued.business_date.into(),
        items.into(),
        notes.into(),
        now.into(),
    ];
    let open_order = Query::select()
        .exprs(values)
        .from(Order)
        .and_where(order_entity::Column::Id.eq(order_id))
        .and_where(order_entity::Column::Status.eq(order::STATUS_OPEN))
        .to_owned();

    let insert = Query::insert()
        .into_table(Kot)
        .columns([
            kot::Column::OrderId,
            kot::Column::OutletId,
            kot::Column::KotNumber,
            kot::Column::ScopeKey,
            kot::Column::Sequence,
            kot::Column::BusinessDate,
            kot::Column::Items,
            kot::Column::Notes,
            kot::Column::CreatedAt,
        ])
        .select_from(open_order)
        .map_err(|e| Error::Database(DbErr::Custom(e.to_string())))?
        .returning_all()
        .to_owned();

    let backend = db.get_database_backend();
    let row = db
        .query_one(backend.build(&insert))
        .await
        .map_err(|e| Error::from_insert(e, &issued.outlet_id, &issued.formatted))?;

    row.map(|row| kot::Model::from_query_result(&row, ""))
        .transpose()
        .map_err(Into::into)
}

/// Lists the tickets of one order, oldest first.
pub async fn list_kots_for_order(
    db: &DatabaseConnection,
    outlet_id: &str,
    order_id: i64,
) -> Result<Vec<kot::Model>> {
    let parent = order::get_order(db, outlet_id, order_id).await?;
    Kot::find()
        .filter(kot::Column::OrderId.eq(parent.id))
        .order_by_asc(kot::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists all tickets of an outlet's business day.
pub async fn list_kots_for_day(
    db: &DatabaseConnection,
    outlet_id: &str,
    business_date: NaiveDate,
) -> Result<Vec<kot::Model>> {
    Kot::find()
        .filter(kot::Column::OutletId.eq(outlet_id))
        .filter(kot::Column::BusinessDate.eq(business_date))
        .order_by_asc(kot::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn ticket() -> NewKot {
        NewKot {
            items: sample_items(),
            notes: Some("table waiting".to_string()),
        }
    }

    #[tokio::test]
    async fn test_kot_numbers_are_per_outlet_per_day() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let today = business_noon(2025, 6, 15);
        let tomorrow = business_noon(2025, 6, 16);

        let order_a = create_test_order(&db, &allocator, "outlet1", today).await?;
        let order_b = create_test_order(&db, &allocator, "outlet2", today).await?;

        let first = create_kot(&db, &allocator, "outlet1", order_a.id, ticket(), today).await?;
        let second = create_kot(&db, &allocator, "outlet1", order_a.id, ticket(), today).await?;
        let other_outlet = create_kot(&db, &allocator, "outlet2", order_b.id, ticket(), today).await?;
        let next_day = create_kot(&db, &allocator, "outlet1", order_a.id, ticket(), tomorrow).await?;

        assert_eq!(first.kot_number, "001");
        assert_eq!(second.kot_number, "002");
        assert_eq!(other_outlet.kot_number, "001");
        assert_eq!(next_day.kot_number, "001");
        assert_eq!(next_day.scope_key, "kot_outlet1_2025-06-16");
        assert_eq!(first.notes.as_deref(), Some("table waiting"));

        Ok(())
    }

    #[tokio::test]
    async fn test_kot_requires_items() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;

        let result = create_kot(&db, &allocator, "outlet1", order.id, NewKot::default(), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let kot = create_kot(&db, &allocator, "outlet1", order.id, ticket(), now).await?;
        assert_eq!(kot.sequence, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_kot_for_unknown_or_foreign_order() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;

        let missing = create_kot(&db, &allocator, "outlet1", 999, ticket(), now).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let foreign = create_kot(&db, &allocator, "outlet2", order.id, ticket(), now).await;
        assert!(matches!(foreign, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_kot_rejected_for_billed_order() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;
        create_test_invoice(&db, &allocator, "outlet1", order.id, now).await?;

        let result = create_kot(&db, &allocator, "outlet1", order.id, ticket(), now).await;
        assert!(matches!(result, Err(Error::OrderClosed { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_ticket_not_inserted_once_order_billed() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;
        let items = order::items_to_json(&sample_items())?;

        let issued = allocator
            .allocate(&db, DocumentKind::Kot, "outlet1", now)
            .await?;
        let inserted = insert_while_open(&db, order.id, &issued, items.clone(), None, now).await?;
        let inserted = inserted.unwrap();
        assert_eq!(inserted.kot_number, "001");
        assert_eq!(inserted.order_id, order.id);
        assert_eq!(inserted.business_date, issued.business_date);

        // Billing lands after this ticket's status check but before its insert.
        let late = allocator
            .allocate(&db, DocumentKind::Kot, "outlet1", now)
            .await?;
        create_test_invoice(&db, &allocator, "outlet1", order.id, now).await?;
        let rejected = insert_while_open(&db, order.id, &late, items, None, now).await?;
        assert!(rejected.is_none());

        let tickets = list_kots_for_order(&db, "outlet1", order.id).await?;
        assert_eq!(tickets.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_rewound_kot_counter_surfaces_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let order = create_test_order(&db, &allocator, "outlet1", now).await?;
        create_kot(&db, &allocator, "outlet1", order.id, ticket(), now).await?;

        rewind_counter(&db, "kot_outlet1_2025-06-15", 0).await?;

        let result = create_kot(&db, &allocator, "outlet1", order.id, ticket(), now).await;
        assert!(matches!(
            result,
            Err(Error::DuplicateNumber { ref number, .. }) if number == "001"
        ));

        let next = create_kot(&db, &allocator, "outlet1", order.id, ticket(), now).await?;
        assert_eq!(next.kot_number, "002");

        Ok(())
    }

    #[tokio::test]
    async fn test_list_kots() -> Result<()> {
        let db = setup_test_db().await?;
        let allocator = test_allocator();
        let now = business_noon(2025, 6, 15);
        let first_order = create_test_order(&db, &allocator, "outlet1", now).await?;
        let second_order = create_test_order(&db, &allocator, "outlet1", now).await?;

        create_kot(&db, &allocator, "outlet1", first_order.id, ticket(), now).await?;
        create_kot(&db, &allocator, "outlet1", second_order.id, ticket(), now).await?;
        create_kot(&db, &allocator, "outlet1", first_order.id, ticket(), now).await?;

        let for_order = list_kots_for_order(&db, "outlet1", first_order.id).await?;
        let numbers: Vec<_> = for_order.iter().map(|k| k.kot_number.as_str()).collect();
        assert_eq!(numbers, vec!["001", "003"]);

        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(list_kots_for_day(&db, "outlet1", day).await?.len(), 3);

        Ok(())
    }
}
