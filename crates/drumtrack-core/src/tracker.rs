//! # DrumTracker Service
//!
//! The single entry point the dashboards call. Holds the store, the clock,
//! the change sink and the configuration; the operations themselves live in
//! [`crate::ledger`], [`crate::returns`] and the read queries below.
//!
//! ## Wiring
//! ```rust
//! use std::sync::Arc;
//! use drumtrack_core::{memory::MemoryStore, DrumTracker, TrackerConfig};
//!
//! let store = Arc::new(MemoryStore::new().with_category("cat-1", "Love White"));
//! let tracker = DrumTracker::new(store).with_config(TrackerConfig::default());
//! # let _ = tracker;
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ts_rs::TS;

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{ChangeEvent, ChangeSink};
use crate::returns::outstanding_quantity;
use crate::stats::{
    self, CustomerSummary, DashboardStats, DashboardWindow, OverdueReport, SalespersonStats,
    Scope,
};
use crate::status::is_overdue;
use crate::store::DrumStore;
use crate::types::{Profile, ReturnRequest, Role, Sale};

/// Drum sales tracker bound to one store.
pub struct DrumTracker<S: ?Sized> {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) changes: Arc<dyn ChangeSink>,
    pub(crate) config: TrackerConfig,
    pub(crate) store: Arc<S>,
}

impl<S: DrumStore + ?Sized> DrumTracker<S> {
    /// Creates a tracker with the system clock, no change sink and the
    /// default configuration.
    pub fn new(store: Arc<S>) -> Self {
        DrumTracker {
            clock: Arc::new(SystemClock),
            changes: Arc::new(()),
            config: TrackerConfig::default(),
            store,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_changes(mut self, changes: Arc<dyn ChangeSink>) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current instant from the configured clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn publish(&self, event: ChangeEvent) {
        tracing::trace!(
            entity = event.entity.as_str(),
            id = %event.entity_id,
            action = event.action.as_str(),
            "publishing change"
        );
        self.changes.publish(event);
    }

    // =========================================================================
    // Read Queries
    // =========================================================================

    /// Dashboard headline numbers for `scope`.
    ///
    /// "Today" and "this month" start at local midnight in `now`'s time zone.
    pub async fn dashboard<Tz: TimeZone>(
        &self,
        scope: &Scope,
        now: &DateTime<Tz>,
    ) -> CoreResult<DashboardStats> {
        let sales = self.store.list_sales(scope.salesperson_id()).await?;
        let returns = self
            .store
            .list_return_requests(scope.salesperson_id())
            .await?;
        let categories = self.store.list_categories().await?;

        let window = DashboardWindow::at(now);
        Ok(stats::dashboard_stats(
            &sales,
            &returns,
            &categories,
            scope,
            &window,
        ))
    }

    /// Per-salesperson rollup over every salesperson profile.
    pub async fn salesperson_overview(
        &self,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SalespersonStats>> {
        let profiles: Vec<Profile> = self
            .store
            .list_profiles()
            .await?
            .into_iter()
            .filter(|p| p.role == Role::Salesperson)
            .collect();
        let sales = self.store.list_sales(None).await?;
        let returns = self.store.list_return_requests(None).await?;

        Ok(stats::per_salesperson(&profiles, &sales, &returns, now))
    }

    /// One salesperson's profile page.
    pub async fn salesperson_profile(
        &self,
        salesperson_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<SalespersonProfile> {
        let profile = self
            .store
            .get_profile(salesperson_id)
            .await?
            .ok_or_else(|| CoreError::SalespersonNotFound(salesperson_id.to_string()))?;

        let sales = self.store.list_sales(Some(salesperson_id)).await?;
        let returns = self
            .store
            .list_return_requests(Some(salesperson_id))
            .await?;

        let stats = stats::per_salesperson(std::slice::from_ref(&profile), &sales, &returns, now)
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::SalespersonNotFound(salesperson_id.to_string()))?;

        let overdue = sales
            .iter()
            .filter(|s| is_overdue(s, now))
            .cloned()
            .collect();

        Ok(SalespersonProfile {
            profile,
            stats,
            sales,
            returns,
            overdue,
        })
    }

    /// Customers visible in `scope`.
    pub async fn customers(
        &self,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<CustomerSummary>> {
        let sales = self.store.list_sales(scope.salesperson_id()).await?;
        Ok(stats::customers(scope.sales(&sales), now))
    }

    /// Overdue sales visible in `scope`.
    pub async fn overdue_report(
        &self,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> CoreResult<OverdueReport> {
        let sales = self.store.list_sales(scope.salesperson_id()).await?;
        Ok(stats::overdue_report(scope.sales(&sales), now))
    }

    /// Pending return requests, oldest first.
    pub async fn pending_approvals(&self) -> CoreResult<Vec<ReturnRequest>> {
        let mut pending: Vec<ReturnRequest> = self
            .store
            .list_return_requests(None)
            .await?
            .into_iter()
            .filter(ReturnRequest::is_pending)
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }

    /// Active sales `salesperson_id` can still file a return against.
    ///
    /// Sales whose pending and approved returns already cover the whole
    /// quantity are left out.
    pub async fn returnable_sales(&self, salesperson_id: &str) -> CoreResult<Vec<ReturnableSale>> {
        let sales = self.store.list_sales(Some(salesperson_id)).await?;
        let returns = self
            .store
            .list_return_requests(Some(salesperson_id))
            .await?;

        Ok(sales
            .into_iter()
            .filter(|s| !s.is_returned())
            .filter_map(|sale| {
                let outstanding = outstanding_quantity(&sale, &returns);
                (outstanding > 0).then_some(ReturnableSale { sale, outstanding })
            })
            .collect())
    }
}

/// Everything on a salesperson's profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalespersonProfile {
    pub profile: Profile,
    pub stats: SalespersonStats,
    /// Newest first.
    pub sales: Vec<Sale>,
    /// Newest first.
    pub returns: Vec<ReturnRequest>,
    pub overdue: Vec<Sale>,
}

/// An active sale and how many drums may still be returned against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnableSale {
    pub sale: Sale,
    pub outstanding: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;
    use crate::types::{CustomerInfo, LineItem, SaleOrder};
    use chrono::{Duration, FixedOffset};

    fn store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_category("cat-a", "Love White")
                .with_category("cat-b", "Mango White")
                .with_shop("shop-1", "Westlands")
                .with_profile("admin", "Admin", Role::Admin)
                .with_profile("sp-1", "Amani", Role::Salesperson)
                .with_profile("sp-2", "Baraka", Role::Salesperson),
        )
    }

    fn order(salesperson: &str, phone: &str, lines: Vec<LineItem>) -> SaleOrder {
        SaleOrder {
            customer: CustomerInfo {
                name: "Jane".to_string(),
                phone: phone.to_string(),
                address: None,
            },
            shop_id: "shop-1".to_string(),
            salesperson_id: salesperson.to_string(),
            line_items: lines,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_scoped_by_role() {
        let clock = Arc::new(FixedClock::new(start()));
        let tracker = DrumTracker::new(store()).with_clock(clock.clone());

        tracker
            .record_sale(order("sp-1", "+1", vec![LineItem::new("cat-a", 3)]))
            .await
            .unwrap();
        tracker
            .record_sale(order("sp-2", "+2", vec![LineItem::new("cat-b", 4)]))
            .await
            .unwrap();

        let now = start() + Duration::hours(1);
        let all = tracker.dashboard(&Scope::All, &now).await.unwrap();
        assert_eq!(all.total_sales_today, 7);
        assert_eq!(all.total_customers, 2);

        let mine = tracker
            .dashboard(&Scope::for_user(Role::Salesperson, "sp-1"), &now)
            .await
            .unwrap();
        assert_eq!(mine.total_sales_all_time, 3);
        assert_eq!(mine.sales_by_product["Mango White"], 0);

        // In UTC-10 the sales were made "yesterday".
        let hawaii = FixedOffset::west_opt(10 * 3600).unwrap();
        let local = (start() + Duration::hours(20)).with_timezone(&hawaii);
        let shifted = tracker.dashboard(&Scope::All, &local).await.unwrap();
        assert_eq!(shifted.total_sales_today, 0);
        assert_eq!(shifted.total_sales_this_month, 7);
    }

    #[tokio::test]
    async fn test_salesperson_profile() {
        let clock = Arc::new(FixedClock::new(start()));
        let tracker = DrumTracker::new(store()).with_clock(clock.clone());

        let sales = tracker
            .record_sale(order("sp-1", "+1", vec![LineItem::new("cat-a", 4)]))
            .await
            .unwrap();
        tracker
            .submit_return(&sales[0].id, "sp-1", 1)
            .await
            .unwrap();

        let later = start() + Duration::days(45);
        let page = tracker.salesperson_profile("sp-1", later).await.unwrap();
        assert_eq!(page.profile.name, "Amani");
        assert_eq!(page.stats.total_sales, 4);
        assert_eq!(page.stats.total_returned, 0);
        assert_eq!(page.returns.len(), 1);
        assert_eq!(page.overdue.len(), 1);

        let err = tracker.salesperson_profile("nobody", later).await.unwrap_err();
        assert!(matches!(err, CoreError::SalespersonNotFound(_)));
    }

    #[tokio::test]
    async fn test_salesperson_overview_skips_admins() {
        let tracker = DrumTracker::new(store()).with_clock(Arc::new(FixedClock::new(start())));
        let rows = tracker.salesperson_overview(start()).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.salesperson.id.as_str()).collect();
        assert_eq!(ids, vec!["sp-1", "sp-2"]);
    }

    #[tokio::test]
    async fn test_pending_approvals_oldest_first() {
        let clock = Arc::new(FixedClock::new(start()));
        let tracker = DrumTracker::new(store()).with_clock(clock.clone());

        let sales = tracker
            .record_sale(order("sp-1", "+1", vec![LineItem::new("cat-a", 5)]))
            .await
            .unwrap();
        let first = tracker.submit_return(&sales[0].id, "sp-1", 1).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = tracker.submit_return(&sales[0].id, "sp-1", 1).await.unwrap();
        tracker.approve_return(&first.id, "admin").await.unwrap();
        clock.advance(Duration::minutes(5));
        let third = tracker.submit_return(&sales[0].id, "sp-1", 1).await.unwrap();

        let queue = tracker.pending_approvals().await.unwrap();
        let ids: Vec<&str> = queue.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), third.id.as_str()]);
    }

    #[tokio::test]
    async fn test_returnable_sales_excludes_fully_claimed() {
        let tracker = DrumTracker::new(store()).with_clock(Arc::new(FixedClock::new(start())));

        let sales = tracker
            .record_sale(order(
                "sp-1",
                "+1",
                vec![LineItem::new("cat-a", 2), LineItem::new("cat-b", 3)],
            ))
            .await
            .unwrap();
        tracker.submit_return(&sales[0].id, "sp-1", 2).await.unwrap();
        tracker.submit_return(&sales[1].id, "sp-1", 1).await.unwrap();

        let returnable = tracker.returnable_sales("sp-1").await.unwrap();
        assert_eq!(returnable.len(), 1);
        assert_eq!(returnable[0].sale.id, sales[1].id);
        assert_eq!(returnable[0].outstanding, 2);

        assert!(tracker.returnable_sales("sp-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customers_and_overdue_report() {
        let clock = Arc::new(FixedClock::new(start()));
        let tracker = DrumTracker::new(store()).with_clock(clock.clone());

        tracker
            .record_sale(order("sp-1", "+1", vec![LineItem::new("cat-a", 2)]))
            .await
            .unwrap();
        clock.advance(Duration::days(20));
        tracker
            .record_sale(order("sp-2", "+1", vec![LineItem::new("cat-b", 1)]))
            .await
            .unwrap();

        let now = start() + Duration::days(35);
        let customers = tracker.customers(&Scope::All, now).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].total_purchased, 3);
        assert!(customers[0].has_overdue);

        let report = tracker
            .overdue_report(&Scope::Salesperson("sp-2".into()), now)
            .await
            .unwrap();
        assert_eq!(report.transactions, 0);

        let report = tracker.overdue_report(&Scope::All, now).await.unwrap();
        assert_eq!(report.transactions, 1);
        assert_eq!(report.entries[0].days_overdue, 5);
    }

    #[tokio::test]
    async fn test_reads_surface_store_failures() {
        let store = store();
        let tracker = DrumTracker::new(store.clone());
        store.set_unavailable(true);

        let err = tracker.pending_approvals().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
