//! Numbering rules - scope derivation and display formatting.
//!
//! Pure functions only; nothing here touches the database. Orders and KOTs are scoped
//! per outlet per business day, invoices per outlet for its whole lifetime. Order numbers
//! carry the Indian financial-year label (April to March), KOT and invoice numbers are
//! the bare zero-padded sequence.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of documents that receive sequential numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Customer order, numbered `NNN/YY-YY` per outlet per day
    Order,
    /// Kitchen order ticket, numbered `NNN` per outlet per day
    Kot,
    /// Invoice, numbered `NNN` per outlet
    Invoice,
}

impl DocumentKind {
    /// Persisted name, also used as the scope key prefix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Kot => "kot",
            Self::Invoice => "invoice",
        }
    }

    /// Whether the counter restarts every business day
    #[must_use]
    pub const fn is_day_scoped(self) -> bool {
        matches!(self, Self::Order | Self::Kot)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numbering scope: every allocation in the same scope shares one counter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Document kind
    pub kind: DocumentKind,
    /// Outlet identifier, validated by [`validate_outlet_id`]
    pub outlet_id: String,
    /// Business day, present only for day-scoped kinds
    pub business_date: Option<NaiveDate>,
}

impl Scope {
    /// Builds the scope for `kind` at `outlet_id` on `business_date`.
    /// The date is dropped for kinds that are not day-scoped.
    #[must_use]
    pub fn new(kind: DocumentKind, outlet_id: &str, business_date: NaiveDate) -> Self {
        Self {
            kind,
            outlet_id: outlet_id.to_string(),
            business_date: kind.is_day_scoped().then_some(business_date),
        }
    }

    /// Rendered key: `order_<outlet>_<YYYY-MM-DD>`, `kot_<outlet>_<YYYY-MM-DD>`
    /// or `invoice_<outlet>`
    #[must_use]
    pub fn key(&self) -> String {
        match self.business_date {
            Some(date) => format!(
                "{}_{}_{}",
                self.kind.as_str(),
                self.outlet_id,
                date.format("%Y-%m-%d")
            ),
            None => format!("{}_{}", self.kind.as_str(), self.outlet_id),
        }
    }
}

/// Rejects outlet identifiers that would render an ambiguous or unreadable scope key.
#[must_use]
pub fn validate_outlet_id(outlet_id: &str) -> bool {
    !outlet_id.is_empty()
        && outlet_id.trim() == outlet_id
        && !outlet_id.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Financial year containing `date` as `(start_year, end_year)`.
/// January to March belong to the year that started the previous April.
#[must_use]
pub fn financial_year(date: NaiveDate) -> (i32, i32) {
    let year = date.year();
    if date.month() <= 3 {
        (year - 1, year)
    } else {
        (year, year + 1)
    }
}

/// Two-digit financial-year label, e.g. `"25-26"`
#[must_use]
pub fn financial_year_label(date: NaiveDate) -> String {
    let (start, end) = financial_year(date);
    format!("{:02}-{:02}", start.rem_euclid(100), end.rem_euclid(100))
}

/// Renders the display number for `sequence`.
///
/// Padding is a minimum width: sequence 1000 renders as `"1000"`, never truncated.
#[must_use]
pub fn format_number(kind: DocumentKind, sequence: i64, business_date: NaiveDate) -> String {
    match kind {
        DocumentKind::Order => {
            format!("{sequence:03}/{}", financial_year_label(business_date))
        }
        DocumentKind::Kot | DocumentKind::Invoice => format!("{sequence:03}"),
    }
}
