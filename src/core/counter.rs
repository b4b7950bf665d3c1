//! Counter persistence - the atomic increment primitive behind number allocation.
//!
//! [`increment`] is a single `INSERT ... ON CONFLICT(scope_key) DO UPDATE SET
//! count = count + 1 RETURNING count` statement. The store serialises it, so two
//! callers (in this process or another one sharing the database) can never observe
//! the same starting value. There is deliberately no read-then-write path here.

use crate::{
    core::numbering::Scope,
    entities::{Counter, counter},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};

/// Atomically increments the counter for `scope`, creating it at 1 if absent,
/// and returns the new count.
pub async fn increment<C>(db: &C, scope: &Scope, now: DateTime<Utc>) -> Result<i64>
where
    C: ConnectionTrait,
{
    let model = counter::ActiveModel {
        scope_key: Set(scope.key()),
        kind: Set(scope.kind.as_str().to_string()),
        outlet_id: Set(scope.outlet_id.clone()),
        business_date: Set(scope.business_date),
        count: Set(1),
        updated_at: Set(now),
    };

    let on_conflict = OnConflict::column(counter::Column::ScopeKey)
        .value(
            counter::Column::Count,
            Expr::col((Counter, counter::Column::Count)).add(1),
        )
        .update_column(counter::Column::UpdatedAt)
        .to_owned();

    let mut insert = Counter::insert(model).on_conflict(on_conflict).into_query();
    insert.returning_col(counter::Column::Count);

    let backend = db.get_database_backend();
    let row = db
        .query_one(backend.build(&insert))
        .await?
        .ok_or(DbErr::RecordNotInserted)?;
    let count: i64 = row.try_get("", "count")?;
    Ok(count)
}

/// Looks up a counter by its scope key.
pub async fn find<C>(db: &C, scope_key: &str) -> Result<Option<counter::Model>>
where
    C: ConnectionTrait,
{
    Counter::find_by_id(scope_key.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every counter of an outlet, ordered by scope key.
pub async fn list_for_outlet<C>(db: &C, outlet_id: &str) -> Result<Vec<counter::Model>>
where
    C: ConnectionTrait,
{
    Counter::find()
        .filter(counter::Column::OutletId.eq(outlet_id))
        .order_by_asc(counter::Column::ScopeKey)
        .all(db)
        .await
        .map_err(Into::into)
}
