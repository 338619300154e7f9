//! # Persistence Port
//!
//! The [`DrumStore`] trait is everything the core needs from the data store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  drumtrack-core                          store implementation          │
//! │                                                                         │
//! │  SaleLedger ──── insert_sale ─────────►  INSERT INTO sales              │
//! │  ReturnWorkflow ─ insert_return_request ► INSERT INTO return_requests   │
//! │                 ─ approve_return_request ► UPDATE ... WHERE             │
//! │                                             status = 'pending'          │
//! │                 ─ mark_sale_returned ───► UPDATE ... WHERE              │
//! │                                             status = 'active'           │
//! │  Dashboards ──── list_* / get_* ────────► SELECT                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations:
//! - `drumtrack_db::Database`: SQLite
//! - [`MemoryStore`](crate::memory::MemoryStore): in-process, for tests
//!
//! The two conditional updates are compare-and-set operations: they return
//! `Ok(false)` when no row matched, and the caller decides what that means.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::types::{DrumCategory, Profile, ReturnRequest, Sale, Shop};

/// Storage interface for drum sales and return requests.
#[async_trait]
pub trait DrumStore: Send + Sync {
    /// All drum categories, ordered by name.
    async fn list_categories(&self) -> StoreResult<Vec<DrumCategory>>;

    /// All shops, ordered by name.
    async fn list_shops(&self) -> StoreResult<Vec<Shop>>;

    /// All user profiles (admins and salespeople).
    async fn list_profiles(&self) -> StoreResult<Vec<Profile>>;

    /// A single profile by user id.
    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Sales, newest first; only `salesperson_id`'s when given.
    async fn list_sales(&self, salesperson_id: Option<&str>) -> StoreResult<Vec<Sale>>;

    /// A single sale by id.
    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>>;

    /// Return requests, newest first; only `salesperson_id`'s when given.
    async fn list_return_requests(
        &self,
        salesperson_id: Option<&str>,
    ) -> StoreResult<Vec<ReturnRequest>>;

    /// Every return request filed against `sale_id`.
    async fn list_returns_for_sale(&self, sale_id: &str) -> StoreResult<Vec<ReturnRequest>>;

    /// A single return request by id.
    async fn get_return_request(&self, id: &str) -> StoreResult<Option<ReturnRequest>>;

    /// Inserts one sale row.
    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()>;

    /// Inserts one return request row.
    async fn insert_return_request(&self, request: &ReturnRequest) -> StoreResult<()>;

    /// Sets a return request to approved if and only if it is still pending.
    ///
    /// Returns `true` when the row changed, `false` when it was not pending
    /// (or does not exist).
    async fn approve_return_request(
        &self,
        id: &str,
        admin_id: &str,
        processed_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Sets a sale to returned if and only if it is still active.
    ///
    /// `actor_id` and `at` identify who triggered the change and when, for
    /// stores that keep an audit trail.
    async fn mark_sale_returned(
        &self,
        sale_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}
