//! [`DrumStore`] backed by SQLite.
//!
//! Each method delegates to a repository; `?` turns [`DbError`](crate::DbError)
//! into [`StoreError`] on the way out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drumtrack_core::{
    DrumCategory, DrumStore, Profile, ReturnRequest, Sale, Shop, StoreError, StoreResult,
};

use crate::pool::Database;

#[async_trait]
impl DrumStore for Database {
    async fn list_categories(&self) -> StoreResult<Vec<DrumCategory>> {
        Ok(self.catalog().list_categories().await?)
    }

    async fn list_shops(&self) -> StoreResult<Vec<Shop>> {
        Ok(self.catalog().list_shops().await?)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.catalog().list_profiles().await?)
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.catalog().get_profile(id).await?)
    }

    async fn list_sales(&self, salesperson_id: Option<&str>) -> StoreResult<Vec<Sale>> {
        Ok(self.sales().list(salesperson_id).await?)
    }

    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.sales().get_by_id(id).await?)
    }

    async fn list_return_requests(
        &self,
        salesperson_id: Option<&str>,
    ) -> StoreResult<Vec<ReturnRequest>> {
        Ok(self.returns().list(salesperson_id).await?)
    }

    async fn list_returns_for_sale(&self, sale_id: &str) -> StoreResult<Vec<ReturnRequest>> {
        Ok(self.returns().list_for_sale(sale_id).await?)
    }

    async fn get_return_request(&self, id: &str) -> StoreResult<Option<ReturnRequest>> {
        Ok(self.returns().get_by_id(id).await?)
    }

    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        self.sales().insert(sale).await.map_err(StoreError::from)
    }

    async fn insert_return_request(&self, request: &ReturnRequest) -> StoreResult<()> {
        self.returns().insert(request).await.map_err(StoreError::from)
    }

    async fn approve_return_request(
        &self,
        id: &str,
        admin_id: &str,
        processed_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self.returns().approve(id, admin_id, processed_at).await?)
    }

    async fn mark_sale_returned(
        &self,
        sale_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self.sales().mark_returned(sale_id, actor_id, at).await?)
    }
}
