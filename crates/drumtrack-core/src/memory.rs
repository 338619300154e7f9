//! In-memory [`DrumStore`] for tests and embedding.
//!
//! Holds everything behind one mutex. Supports failure injection so the
//! partial-failure and lost-race paths can be exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::store::DrumStore;
use crate::types::{
    DrumCategory, Profile, ReturnRequest, ReturnStatus, Role, Sale, SaleStatus, Shop,
};

#[derive(Debug, Default)]
struct Tables {
    categories: Vec<DrumCategory>,
    shops: Vec<Shop>,
    profiles: Vec<Profile>,
    sales: Vec<Sale>,
    returns: Vec<ReturnRequest>,
    /// Remaining successful sale inserts before failing; `None` = never fail.
    sale_inserts_left: Option<usize>,
    /// Approves the next request read by `get_return_request` as this admin,
    /// after handing out the still-pending row.
    rival_approver: Option<String>,
    fail_sale_status_updates: bool,
    unavailable: bool,
}

/// A `DrumStore` backed by vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn available(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        let tables = self.lock();
        if tables.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(tables)
    }

    /// Adds a drum category.
    pub fn with_category(self, id: &str, name: &str) -> Self {
        self.lock().categories.push(DrumCategory {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Adds a shop.
    pub fn with_shop(self, id: &str, name: &str) -> Self {
        self.lock().shops.push(Shop {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Adds a user profile.
    pub fn with_profile(self, id: &str, name: &str, role: Role) -> Self {
        self.lock().profiles.push(Profile {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            role,
        });
        self
    }

    /// Lets `n` more sale inserts succeed, then fails every one after.
    pub fn fail_sale_inserts_after(&self, n: usize) {
        self.lock().sale_inserts_left = Some(n);
    }

    /// Simulates another admin approving between a read and the write.
    ///
    /// The next `get_return_request` returns the pending row and then marks
    /// it approved by `admin_id`, so the caller's conditional update misses.
    pub fn race_next_approval(&self, admin_id: &str) {
        self.lock().rival_approver = Some(admin_id.to_string());
    }

    /// Makes `mark_sale_returned` fail.
    pub fn fail_sale_status_updates(&self, fail: bool) {
        self.lock().fail_sale_status_updates = fail;
    }

    /// Makes every operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of stored sale rows.
    pub fn sale_count(&self) -> usize {
        self.lock().sales.len()
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

#[async_trait]
impl DrumStore for MemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<DrumCategory>> {
        let mut rows = self.available()?.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_shops(&self) -> StoreResult<Vec<Shop>> {
        let mut rows = self.available()?.shops.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.available()?.profiles.clone())
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.available()?.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_sales(&self, salesperson_id: Option<&str>) -> StoreResult<Vec<Sale>> {
        let rows: Vec<Sale> = self
            .available()?
            .sales
            .iter()
            .filter(|s| salesperson_id.map_or(true, |sp| s.salesperson_id == sp))
            .cloned()
            .collect();
        Ok(newest_first(rows, |s| s.created_at))
    }

    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.available()?.sales.iter().find(|s| s.id == id).cloned())
    }

    async fn list_return_requests(
        &self,
        salesperson_id: Option<&str>,
    ) -> StoreResult<Vec<ReturnRequest>> {
        let rows: Vec<ReturnRequest> = self
            .available()?
            .returns
            .iter()
            .filter(|r| salesperson_id.map_or(true, |sp| r.salesperson_id == sp))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.created_at))
    }

    async fn list_returns_for_sale(&self, sale_id: &str) -> StoreResult<Vec<ReturnRequest>> {
        Ok(self
            .available()?
            .returns
            .iter()
            .filter(|r| r.is_for_sale(sale_id))
            .cloned()
            .collect())
    }

    async fn get_return_request(&self, id: &str) -> StoreResult<Option<ReturnRequest>> {
        let mut tables = self.available()?;
        let Some(rival) = tables.rival_approver.take() else {
            return Ok(tables.returns.iter().find(|r| r.id == id).cloned());
        };

        let Some(request) = tables.returns.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        let seen = request.clone();
        if request.status == ReturnStatus::Pending {
            request.status = ReturnStatus::Approved;
            request.processed_at = Some(request.created_at);
            request.processed_by = Some(rival);
        }
        Ok(Some(seen))
    }

    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        let mut tables = self.available()?;

        match tables.sale_inserts_left {
            Some(0) => {
                return Err(StoreError::Operation("injected sale insert failure".to_string()))
            }
            Some(ref mut left) => *left -= 1,
            None => {}
        }

        if tables.sales.iter().any(|s| s.id == sale.id) {
            return Err(StoreError::Constraint(format!("sales.id {}", sale.id)));
        }
        tables.sales.push(sale.clone());
        Ok(())
    }

    async fn insert_return_request(&self, request: &ReturnRequest) -> StoreResult<()> {
        let mut tables = self.available()?;
        if tables.returns.iter().any(|r| r.id == request.id) {
            return Err(StoreError::Constraint(format!(
                "return_requests.id {}",
                request.id
            )));
        }
        tables.returns.push(request.clone());
        Ok(())
    }

    async fn approve_return_request(
        &self,
        id: &str,
        admin_id: &str,
        processed_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.available()?;
        match tables
            .returns
            .iter_mut()
            .find(|r| r.id == id && r.status == ReturnStatus::Pending)
        {
            Some(request) => {
                request.status = ReturnStatus::Approved;
                request.processed_at = Some(processed_at);
                request.processed_by = Some(admin_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_sale_returned(
        &self,
        sale_id: &str,
        _actor_id: &str,
        _at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.available()?;
        if tables.fail_sale_status_updates {
            return Err(StoreError::Operation(
                "injected sale status update failure".to_string(),
            ));
        }
        match tables
            .sales
            .iter_mut()
            .find(|s| s.id == sale_id && s.status == SaleStatus::Active)
        {
            Some(sale) => {
                sale.status = SaleStatus::Returned;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::due_date_for;
    use chrono::{Duration, TimeZone};

    fn sale(id: &str, salesperson: &str, offset_days: i64) -> Sale {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + Duration::days(offset_days);
        Sale {
            id: id.to_string(),
            customer_name: "Jane".to_string(),
            customer_phone: "+1555".to_string(),
            customer_address: None,
            shop_id: "shop-1".to_string(),
            salesperson_id: salesperson.to_string(),
            category_id: "cat-1".to_string(),
            quantity: 1,
            unit_price: Money::zero(),
            total_amount: Money::zero(),
            created_at,
            due_date: due_date_for(created_at),
            status: SaleStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_list_sales_filters_and_orders() {
        let store = MemoryStore::new();
        store.insert_sale(&sale("a", "sp-1", 0)).await.unwrap();
        store.insert_sale(&sale("b", "sp-2", 1)).await.unwrap();
        store.insert_sale(&sale("c", "sp-1", 2)).await.unwrap();

        let all = store.list_sales(None).await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );

        let mine = store.list_sales(Some("sp-1")).await.unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sale_rejected() {
        let store = MemoryStore::new();
        store.insert_sale(&sale("a", "sp-1", 0)).await.unwrap();
        let err = store.insert_sale(&sale("a", "sp-1", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_sale_inserts_after(1);
        assert!(store.insert_sale(&sale("a", "sp-1", 0)).await.is_ok());
        assert!(store.insert_sale(&sale("b", "sp-1", 0)).await.is_err());

        store.set_unavailable(true);
        assert!(matches!(
            store.list_sales(None).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_sale_returned_is_conditional() {
        let store = MemoryStore::new();
        store.insert_sale(&sale("a", "sp-1", 0)).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        assert!(store.mark_sale_returned("a", "admin", at).await.unwrap());
        assert!(!store.mark_sale_returned("a", "admin", at).await.unwrap());
        assert!(!store.mark_sale_returned("missing", "admin", at).await.unwrap());

        store.fail_sale_status_updates(true);
        assert!(store.mark_sale_returned("a", "admin", at).await.is_err());
    }

    #[tokio::test]
    async fn test_rival_approval_lands_after_read() {
        let store = MemoryStore::new();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        store
            .insert_return_request(&ReturnRequest {
                id: "r1".to_string(),
                sale_id: Some("a".to_string()),
                shop_id: "shop-1".to_string(),
                category_id: "cat-1".to_string(),
                salesperson_id: "sp-1".to_string(),
                customer_phone: "+1555".to_string(),
                quantity: 1,
                status: ReturnStatus::Pending,
                created_at,
                processed_at: None,
                processed_by: None,
            })
            .await
            .unwrap();

        store.race_next_approval("rival");
        let seen = store.get_return_request("r1").await.unwrap().unwrap();
        assert_eq!(seen.status, ReturnStatus::Pending);

        let now = store.get_return_request("r1").await.unwrap().unwrap();
        assert_eq!(now.status, ReturnStatus::Approved);
        assert_eq!(now.processed_by.as_deref(), Some("rival"));
        assert!(!store.approve_return_request("r1", "admin", created_at).await.unwrap());
    }
}
