//! # Return Request Repository
//!
//! Database operations for return requests.
//!
//! The pending → approved transition is a single conditional UPDATE, so
//! two admins approving the same request at once cannot both succeed.

use chrono::{DateTime, Utc};
use drumtrack_core::{ChangeAction, EntityKind, ReturnRequest};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::audit;

const SELECT_RETURNS: &str = r#"
    SELECT
        id, sale_id, shop_id, category_id, salesperson_id, customer_phone,
        quantity, status, created_at, processed_at, processed_by
    FROM return_requests
"#;

/// Repository for return request operations.
#[derive(Debug, Clone)]
pub struct ReturnRequestRepository {
    pool: SqlitePool,
}

impl ReturnRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRequestRepository { pool }
    }

    /// Requests newest first, optionally only one salesperson's.
    pub async fn list(&self, salesperson_id: Option<&str>) -> DbResult<Vec<ReturnRequest>> {
        let sql = format!(
            "{SELECT_RETURNS} WHERE (?1 IS NULL OR salesperson_id = ?1) \
             ORDER BY created_at DESC, rowid"
        );
        let rows = sqlx::query_as::<_, ReturnRequest>(&sql)
            .bind(salesperson_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Every request filed against `sale_id`, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<ReturnRequest>> {
        let sql = format!("{SELECT_RETURNS} WHERE sale_id = ?1 ORDER BY created_at, rowid");
        let rows = sqlx::query_as::<_, ReturnRequest>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ReturnRequest>> {
        let sql = format!("{SELECT_RETURNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, ReturnRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Inserts a request together with its audit entry.
    pub async fn insert(&self, request: &ReturnRequest) -> DbResult<()> {
        debug!(
            id = %request.id,
            sale_id = ?request.sale_id,
            quantity = request.quantity,
            "Inserting return request"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO return_requests (
                id, sale_id, shop_id, category_id, salesperson_id, customer_phone,
                quantity, status, created_at, processed_at, processed_by
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11
            )
            "#,
        )
        .bind(&request.id)
        .bind(&request.sale_id)
        .bind(&request.shop_id)
        .bind(&request.category_id)
        .bind(&request.salesperson_id)
        .bind(&request.customer_phone)
        .bind(request.quantity)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.processed_at)
        .bind(&request.processed_by)
        .execute(&mut *tx)
        .await?;

        audit::record(
            &mut tx,
            ChangeAction::Created,
            EntityKind::ReturnRequest,
            &request.id,
            Some(&request.salesperson_id),
            json!({
                "sale_id": request.sale_id,
                "quantity": request.quantity,
            }),
            request.created_at,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Approves a request if it is still pending.
    ///
    /// Returns `false` (and writes nothing) when the request is missing or
    /// already approved.
    pub async fn approve(
        &self,
        id: &str,
        admin_id: &str,
        processed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE return_requests SET
                status = 'approved',
                processed_at = ?2,
                processed_by = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(processed_at)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        audit::record(
            &mut tx,
            ChangeAction::Approved,
            EntityKind::ReturnRequest,
            id,
            Some(admin_id),
            json!({ "status": "approved" }),
            processed_at,
        )
        .await?;

        tx.commit().await?;
        debug!(id, admin_id, "Return request approved");
        Ok(true)
    }

    /// Number of requests awaiting approval.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM return_requests WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
