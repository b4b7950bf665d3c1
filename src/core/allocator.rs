//! Sequential number allocator.
//!
//! [`NumberAllocator::allocate`] turns `(kind, outlet, now)` into the next number of the
//! matching scope. All concurrency control lives in the store's atomic increment
//! (see [`crate::core::counter::increment`]); the allocator itself holds no locks.
//!
//! The business day is the calendar date of `now` in the configured timezone. The same
//! date drives the day scope and the financial-year label, so a number can never be
//! filed under one day and labelled with another.
//!
//! Numbers are never handed back. If the caller fails after allocating, the number is
//! simply skipped.

use crate::{
    config::settings::NumberingSettings,
    core::{
        counter,
        numbering::{self, DocumentKind, Scope},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::{ConnectionTrait, DbErr, RuntimeErr, sqlx};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// A number handed out by the allocator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedNumber {
    /// Document kind the number was issued for
    pub kind: DocumentKind,
    /// Outlet the number belongs to
    pub outlet_id: String,
    /// Counter scope key
    pub scope_key: String,
    /// Business day of the allocation
    pub business_date: NaiveDate,
    /// Raw sequence within the scope, starting at 1
    pub sequence: i64,
    /// Display form, e.g. `"007/25-26"` or `"042"`
    pub formatted: String,
}

/// Allocates per-outlet document numbers against the counters table
#[derive(Debug, Clone)]
pub struct NumberAllocator {
    timezone: Tz,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl NumberAllocator {
    /// Creates an allocator for the given business timezone with the default retry budget.
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        let defaults = NumberingSettings::default();
        Self {
            timezone,
            max_attempts: defaults.max_attempts,
            retry_backoff: defaults.retry_backoff(),
        }
    }

    /// Creates an allocator from the `[numbering]` settings section.
    #[must_use]
    pub const fn from_settings(settings: &NumberingSettings) -> Self {
        Self {
            timezone: settings.timezone,
            max_attempts: settings.max_attempts,
            retry_backoff: settings.retry_backoff(),
        }
    }

    /// Overrides the retry budget. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn with_retry(mut self, max_attempts: u32, retry_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = retry_backoff;
        self
    }

    /// Business timezone
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Calendar date of `now` in the business timezone
    #[must_use]
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Derives the numbering scope, rejecting unusable outlet identifiers.
    pub fn scope_for(
        &self,
        kind: DocumentKind,
        outlet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Scope> {
        if !numbering::validate_outlet_id(outlet_id) {
            return Err(Error::InvalidOutlet {
                outlet_id: outlet_id.to_string(),
            });
        }
        Ok(Scope::new(kind, outlet_id, self.business_date(now)))
    }

    /// Issues the next number for `(kind, outlet_id)` at `now`.
    ///
    /// Transient store errors (pool exhaustion, a locked database) are retried with a
    /// linear backoff; a failed attempt never committed an increment, so retrying cannot
    /// skip or repeat a number.
    ///
    /// # Errors
    /// * [`Error::InvalidOutlet`] if the outlet id is empty or contains whitespace.
    /// * [`Error::AllocationFailed`] if the increment fails permanently or the retry
    ///   budget runs out. No number is issued in that case.
    #[instrument(skip(self, db))]
    pub async fn allocate<C>(
        &self,
        db: &C,
        kind: DocumentKind,
        outlet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedNumber>
    where
        C: ConnectionTrait,
    {
        let scope = self.scope_for(kind, outlet_id, now)?;
        let scope_key = scope.key();
        let business_date = self.business_date(now);

        let mut attempt = 0;
        let sequence = loop {
            attempt += 1;
            match counter::increment(db, &scope, now).await {
                Ok(sequence) => break sequence,
                Err(Error::Database(err)) if attempt < self.max_attempts && is_transient(&err) => {
                    warn!(
                        "Transient error allocating {} (attempt {}/{}): {}",
                        scope_key, attempt, self.max_attempts, err
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(err) => {
                    error!(
                        "Allocation for {} failed after {} attempt(s): {}",
                        scope_key, attempt, err
                    );
                    return Err(Error::AllocationFailed {
                        scope_key,
                        attempts: attempt,
                        reason: err.to_string(),
                    });
                }
            }
        };

        let formatted = numbering::format_number(kind, sequence, business_date);
        info!("Allocated {} #{} ({})", scope_key, sequence, formatted);

        Ok(IssuedNumber {
            kind,
            outlet_id: outlet_id.to_string(),
            scope_key,
            business_date,
            sequence,
            formatted,
        })
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Whether a store error is worth another attempt: pool exhaustion, or `SQLite`
/// reporting `SQLITE_BUSY`/`SQLITE_LOCKED` (including their extended codes).
fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(RuntimeErr::SqlxError(source))
        | DbErr::Exec(RuntimeErr::SqlxError(source))
        | DbErr::Query(RuntimeErr::SqlxError(source)) => sqlite_code(source)
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
        _ => false,
    }
}

/// Extended `SQLite` result code carried by a driver error
fn sqlite_code(err: &sqlx::Error) -> Option<i32> {
    err.as_database_error()?.code()?.parse().ok()
}
