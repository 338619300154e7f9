//! # Aggregation Engine
//!
//! Dashboard statistics computed from a snapshot of sales and return
//! requests. Every function here is pure, keeps no state, and gives the
//! same answer for any ordering of its inputs. Empty inputs yield zeros.
//!
//! ## Role Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scope::for_user(role, user_id)                                         │
//! │     ├── Admin / StoreManager ──► Scope::All                             │
//! │     └── Salesperson ───────────► Scope::Salesperson(user_id)            │
//! │                                                                         │
//! │  sales ──► scope.sales(..) ──┐                                          │
//! │                              ├──► one set of aggregation functions      │
//! │  returns ► scope.returns(..) ┘    (no per-role copies)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions accept any `IntoIterator` of references so a scoped iterator,
//! a slice, or a `Vec<&Sale>` all work.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeBounds;
use ts_rs::TS;

use crate::status::{days_overdue, is_overdue};
use crate::types::{DrumCategory, Profile, ReturnRequest, ReturnStatus, Role, Sale};

/// Bucket for sales whose category is not in the catalog.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

// =============================================================================
// Scope
// =============================================================================

/// Which records a caller may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every salesperson's records.
    All,
    /// Only records owned by this salesperson.
    Salesperson(String),
}

impl Scope {
    /// Scope for an authenticated user.
    pub fn for_user(role: Role, user_id: &str) -> Self {
        if role.sees_all() {
            Scope::All
        } else {
            Scope::Salesperson(user_id.to_string())
        }
    }

    /// The salesperson filter to pass to the store, if any.
    pub fn salesperson_id(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Salesperson(id) => Some(id),
        }
    }

    pub fn includes_sale(&self, sale: &Sale) -> bool {
        self.salesperson_id()
            .map_or(true, |id| sale.salesperson_id == id)
    }

    pub fn includes_return(&self, request: &ReturnRequest) -> bool {
        self.salesperson_id()
            .map_or(true, |id| request.salesperson_id == id)
    }

    /// The sales visible in this scope.
    pub fn sales<'a>(&'a self, sales: &'a [Sale]) -> impl Iterator<Item = &'a Sale> + 'a {
        sales.iter().filter(move |s| self.includes_sale(s))
    }

    /// The return requests visible in this scope.
    pub fn returns<'a>(
        &'a self,
        returns: &'a [ReturnRequest],
    ) -> impl Iterator<Item = &'a ReturnRequest> + 'a {
        returns.iter().filter(move |r| self.includes_return(r))
    }
}

// =============================================================================
// Time Windows
// =============================================================================

/// "Today" and "this month" boundaries for a dashboard render.
///
/// Boundaries are local midnights in the time zone of the `now` passed to
/// [`DashboardWindow::at`], expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardWindow {
    pub now: DateTime<Utc>,
    pub start_of_today: DateTime<Utc>,
    pub start_of_month: DateTime<Utc>,
}

impl DashboardWindow {
    /// Computes the window for `now` in `now`'s own time zone.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{FixedOffset, TimeZone, Utc};
    /// use drumtrack_core::stats::DashboardWindow;
    ///
    /// let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
    /// let now = nairobi.with_ymd_and_hms(2026, 7, 15, 1, 30, 0).unwrap();
    /// let window = DashboardWindow::at(&now);
    ///
    /// // Local midnight in Nairobi is 21:00 UTC the day before.
    /// assert_eq!(window.start_of_today, Utc.with_ymd_and_hms(2026, 7, 14, 21, 0, 0).unwrap());
    /// assert_eq!(window.start_of_month, Utc.with_ymd_and_hms(2026, 6, 30, 21, 0, 0).unwrap());
    /// ```
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let first_of_month =
            NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

        DashboardWindow {
            now: now.with_timezone(&Utc),
            start_of_today: local_midnight(&tz, today),
            start_of_month: local_midnight(&tz, first_of_month),
        }
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump: use the offset in force just after.
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&midnight).fix();
            let utc = midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    }
}

// =============================================================================
// Scalar Aggregations
// =============================================================================

/// Total drums sold with `created_at` inside `range`.
///
/// ```rust,ignore
/// sales_in_range(&sales, window.start_of_today..);   // today
/// sales_in_range(&sales, window.start_of_month..);   // this month
/// sales_in_range(&sales, ..);                        // all time
/// ```
pub fn sales_in_range<'a, I, R>(sales: I, range: R) -> i64
where
    I: IntoIterator<Item = &'a Sale>,
    R: RangeBounds<DateTime<Utc>>,
{
    sales
        .into_iter()
        .filter(|s| range.contains(&s.created_at))
        .map(|s| s.quantity)
        .sum()
}

fn returned_with_status<'a, I>(returns: I, status: ReturnStatus) -> i64
where
    I: IntoIterator<Item = &'a ReturnRequest>,
{
    returns
        .into_iter()
        .filter(|r| r.status == status)
        .map(|r| r.quantity)
        .sum()
}

/// Total drums in approved return requests.
pub fn total_returned<'a, I>(returns: I) -> i64
where
    I: IntoIterator<Item = &'a ReturnRequest>,
{
    returned_with_status(returns, ReturnStatus::Approved)
}

/// Total drums in return requests awaiting approval.
pub fn total_pending_approval<'a, I>(returns: I) -> i64
where
    I: IntoIterator<Item = &'a ReturnRequest>,
{
    returned_with_status(returns, ReturnStatus::Pending)
}

/// Number of overdue sale rows at `now`.
pub fn overdue_count<'a, I>(sales: I, now: DateTime<Utc>) -> usize
where
    I: IntoIterator<Item = &'a Sale>,
{
    sales.into_iter().filter(|s| is_overdue(s, now)).count()
}

/// Number of distinct customers (by phone number).
pub fn unique_customer_count<'a, I>(sales: I) -> usize
where
    I: IntoIterator<Item = &'a Sale>,
{
    sales
        .into_iter()
        .map(|s| s.customer_phone.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Drums sold per category name.
///
/// Every catalog category appears, at zero when unsold. Sales whose
/// category is missing from `categories` are counted under
/// [`UNKNOWN_CATEGORY`].
pub fn sales_by_product<'a, I>(sales: I, categories: &[DrumCategory]) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = &'a Sale>,
{
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut totals: BTreeMap<String, i64> = categories
        .iter()
        .map(|c| (c.name.clone(), 0))
        .collect();

    for sale in sales {
        let name = names
            .get(sale.category_id.as_str())
            .copied()
            .unwrap_or(UNKNOWN_CATEGORY);
        *totals.entry(name.to_string()).or_insert(0) += sale.quantity;
    }

    totals
}

/// `round(returned / sold × 100)`, or 0 when nothing was sold.
///
/// Halves round up, so 1 of 8 (12.5%) is 13.
pub fn return_rate(total_returned: i64, total_sales: i64) -> i64 {
    if total_sales <= 0 {
        return 0;
    }
    let returned = i128::from(total_returned.max(0));
    let sold = i128::from(total_sales);
    ((returned * 200 + sold) / (sold * 2)) as i64
}

// =============================================================================
// Dashboard
// =============================================================================

/// The headline numbers on the admin and salesperson dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_sales_today: i64,
    pub total_sales_this_month: i64,
    pub total_sales_all_time: i64,
    pub total_returned: i64,
    pub total_pending_approval: i64,
    /// Overdue sale rows (not drums).
    pub total_overdue: usize,
    pub total_customers: usize,
    pub sales_by_product: BTreeMap<String, i64>,
}

/// Computes [`DashboardStats`] for everything visible in `scope`.
pub fn dashboard_stats(
    sales: &[Sale],
    returns: &[ReturnRequest],
    categories: &[DrumCategory],
    scope: &Scope,
    window: &DashboardWindow,
) -> DashboardStats {
    let visible: Vec<&Sale> = scope.sales(sales).collect();
    let visible_returns: Vec<&ReturnRequest> = scope.returns(returns).collect();

    DashboardStats {
        total_sales_today: sales_in_range(visible.iter().copied(), window.start_of_today..),
        total_sales_this_month: sales_in_range(visible.iter().copied(), window.start_of_month..),
        total_sales_all_time: sales_in_range(visible.iter().copied(), ..),
        total_returned: total_returned(visible_returns.iter().copied()),
        total_pending_approval: total_pending_approval(visible_returns.iter().copied()),
        total_overdue: overdue_count(visible.iter().copied(), window.now),
        total_customers: unique_customer_count(visible.iter().copied()),
        sales_by_product: sales_by_product(visible.iter().copied(), categories),
    }
}

// =============================================================================
// Per-Salesperson Rollup
// =============================================================================

/// One row of the admin "Salespeople" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalespersonStats {
    pub salesperson: Profile,
    pub total_sales: i64,
    pub total_returned: i64,
    /// Overdue sale rows.
    pub total_overdue: usize,
    /// Percent, rounded; 0 when nothing was sold.
    pub return_rate: i64,
}

/// Rolls up sales and approved returns per profile.
///
/// Output is sorted by name, then id.
pub fn per_salesperson(
    profiles: &[Profile],
    sales: &[Sale],
    returns: &[ReturnRequest],
    now: DateTime<Utc>,
) -> Vec<SalespersonStats> {
    let mut rows: Vec<SalespersonStats> = profiles
        .iter()
        .map(|profile| {
            let scope = Scope::Salesperson(profile.id.clone());
            let total_sales = sales_in_range(scope.sales(sales), ..);
            let total_returned = total_returned(scope.returns(returns));

            SalespersonStats {
                salesperson: profile.clone(),
                total_sales,
                total_returned,
                total_overdue: overdue_count(scope.sales(sales), now),
                return_rate: return_rate(total_returned, total_sales),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.salesperson
            .name
            .cmp(&b.salesperson.name)
            .then_with(|| a.salesperson.id.cmp(&b.salesperson.id))
    });
    rows
}

/// The `n` salespeople with the most drums sold.
pub fn top_salespeople(stats: &[SalespersonStats], n: usize) -> Vec<SalespersonStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.salesperson.name.cmp(&b.salesperson.name))
            .then_with(|| a.salesperson.id.cmp(&b.salesperson.id))
    });
    ranked.truncate(n);
    ranked
}

// =============================================================================
// Customers
// =============================================================================

/// A customer, derived by grouping sales on phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSummary {
    pub phone: String,
    /// Name on the most recent sale.
    pub name: String,
    pub total_purchased: i64,
    pub has_overdue: bool,
    #[ts(as = "String")]
    pub last_purchase: DateTime<Utc>,
}

/// Groups sales into customers.
///
/// Sorted by most recent purchase first, then phone.
pub fn customers<'a, I>(sales: I, now: DateTime<Utc>) -> Vec<CustomerSummary>
where
    I: IntoIterator<Item = &'a Sale>,
{
    struct Acc<'s> {
        latest: &'s Sale,
        total: i64,
        overdue: bool,
    }

    let mut by_phone: BTreeMap<&str, Acc<'a>> = BTreeMap::new();
    for sale in sales {
        let acc = by_phone.entry(sale.customer_phone.as_str()).or_insert(Acc {
            latest: sale,
            total: 0,
            overdue: false,
        });
        acc.total += sale.quantity;
        acc.overdue |= is_overdue(sale, now);
        if (sale.created_at, &sale.id) > (acc.latest.created_at, &acc.latest.id) {
            acc.latest = sale;
        }
    }

    let mut rows: Vec<CustomerSummary> = by_phone
        .into_iter()
        .map(|(phone, acc)| CustomerSummary {
            phone: phone.to_string(),
            name: acc.latest.customer_name.clone(),
            total_purchased: acc.total,
            has_overdue: acc.overdue,
            last_purchase: acc.latest.created_at,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.last_purchase
            .cmp(&a.last_purchase)
            .then_with(|| a.phone.cmp(&b.phone))
    });
    rows
}

// =============================================================================
// Overdue Report
// =============================================================================

/// An overdue sale with how late it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverdueEntry {
    pub sale: Sale,
    pub days_overdue: i64,
}

/// The "Overdue Drums" page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverdueReport {
    /// Most overdue first.
    pub entries: Vec<OverdueEntry>,
    /// Drums still out past their due date.
    pub total_quantity: i64,
    pub affected_customers: usize,
    pub transactions: usize,
}

/// Collects overdue sales at `now`.
pub fn overdue_report<'a, I>(sales: I, now: DateTime<Utc>) -> OverdueReport
where
    I: IntoIterator<Item = &'a Sale>,
{
    let mut entries: Vec<OverdueEntry> = sales
        .into_iter()
        .filter_map(|sale| {
            days_overdue(sale, now).map(|days| OverdueEntry {
                sale: sale.clone(),
                days_overdue: days,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.sale
            .due_date
            .cmp(&b.sale.due_date)
            .then_with(|| a.sale.id.cmp(&b.sale.id))
    });

    OverdueReport {
        total_quantity: entries.iter().map(|e| e.sale.quantity).sum(),
        affected_customers: unique_customer_count(entries.iter().map(|e| &e.sale)),
        transactions: entries.len(),
        entries,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
