//! # Status Resolver
//!
//! Derives the display state of a sale from its stored status and a
//! reference instant. Every read path (dashboard, customer directory,
//! overdue report, salesperson profile) goes through [`resolve_sale_status`]
//! so they all agree on what "overdue" means.
//!
//! ## Rules
//! ```text
//! stored status   now vs due_date     display state
//! ─────────────   ─────────────────   ─────────────
//! returned        (any)               Returned
//! active          now >  due_date     Overdue
//! active          now <= due_date     Active
//! ```
//!
//! Exactly at `due_date` a sale is still `Active` (strict greater-than).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Sale, SaleStatus};

/// What the dashboard shows for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    Active,
    Returned,
    Overdue,
}

/// Resolves the display state of `sale` at instant `now`.
///
/// ## Example
/// ```rust
/// use chrono::Duration;
/// # use chrono::{TimeZone, Utc};
/// # use drumtrack_core::money::Money;
/// # use drumtrack_core::types::{due_date_for, Sale, SaleStatus};
/// use drumtrack_core::status::{resolve_sale_status, SaleState};
///
/// # let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
/// # let sale = Sale {
/// #     id: "s".into(), customer_name: "Jane".into(), customer_phone: "+1555".into(),
/// #     customer_address: None, shop_id: "shop".into(), salesperson_id: "sp".into(),
/// #     category_id: "cat".into(), quantity: 1, unit_price: Money::zero(),
/// #     total_amount: Money::zero(), created_at, due_date: due_date_for(created_at),
/// #     status: SaleStatus::Active,
/// # };
/// assert_eq!(resolve_sale_status(&sale, sale.due_date), SaleState::Active);
/// assert_eq!(
///     resolve_sale_status(&sale, sale.due_date + Duration::seconds(1)),
///     SaleState::Overdue
/// );
/// ```
pub fn resolve_sale_status(sale: &Sale, now: DateTime<Utc>) -> SaleState {
    match sale.status {
        SaleStatus::Returned => SaleState::Returned,
        SaleStatus::Active if now > sale.due_date => SaleState::Overdue,
        SaleStatus::Active => SaleState::Active,
    }
}

/// Shorthand for `resolve_sale_status(sale, now) == SaleState::Overdue`.
#[inline]
pub fn is_overdue(sale: &Sale, now: DateTime<Utc>) -> bool {
    resolve_sale_status(sale, now) == SaleState::Overdue
}

/// Whole days past the due date, or `None` when the sale is not overdue.
///
/// Partial days are truncated, so a sale 36 hours late is 1 day overdue
/// and a sale one second late is 0 days overdue (but still overdue).
pub fn days_overdue(sale: &Sale, now: DateTime<Utc>) -> Option<i64> {
    is_overdue(sale, now).then(|| (now - sale.due_date).num_days())
}

// =============================================================================
// Unit Tests
// =============================================================================
