//! # Sale Repository
//!
//! Database operations for sale rows.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. INSERT (one row per category line)                                 │
//! │     └── insert() → status 'active', audit 'created'                    │
//! │                                                                         │
//! │  2. FULLY RETURNED                                                     │
//! │     └── mark_returned() → UPDATE ... WHERE status = 'active'           │
//! │         audit 'returned' (only when the row changed)                   │
//! │                                                                         │
//! │  Overdue is never written; it is derived from due_date at read time.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use drumtrack_core::{ChangeAction, EntityKind, Sale};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::audit;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sales newest first, optionally only one salesperson's.
    pub async fn list(&self, salesperson_id: Option<&str>) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, customer_name, customer_phone, customer_address,
                shop_id, salesperson_id, category_id,
                quantity, unit_price, total_amount,
                created_at, due_date, status
            FROM sales
            WHERE (?1 IS NULL OR salesperson_id = ?1)
            ORDER BY created_at DESC, rowid
            "#,
        )
        .bind(salesperson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, customer_name, customer_phone, customer_address,
                shop_id, salesperson_id, category_id,
                quantity, unit_price, total_amount,
                created_at, due_date, status
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Inserts one sale row together with its audit entry.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            category_id = %sale.category_id,
            quantity = sale.quantity,
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_name, customer_phone, customer_address,
                shop_id, salesperson_id, category_id,
                quantity, unit_price, total_amount,
                created_at, due_date, status
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.customer_address)
        .bind(&sale.shop_id)
        .bind(&sale.salesperson_id)
        .bind(&sale.category_id)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.total_amount)
        .bind(sale.created_at)
        .bind(sale.due_date)
        .bind(sale.status)
        .execute(&mut *tx)
        .await?;

        audit::record(
            &mut tx,
            ChangeAction::Created,
            EntityKind::Sale,
            &sale.id,
            Some(&sale.salesperson_id),
            json!({
                "customer_phone": sale.customer_phone,
                "category_id": sale.category_id,
                "quantity": sale.quantity,
                "total_amount": sale.total_amount.cents(),
            }),
            sale.created_at,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sets a sale to returned if it is still active.
    ///
    /// Returns `false` (and writes nothing) when the sale is missing or
    /// already returned. The audit row is attributed to `actor_id` at `at`.
    pub async fn mark_returned(
        &self,
        sale_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sales SET status = 'returned' WHERE id = ?1 AND status = 'active'",
        )
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        audit::record(
            &mut tx,
            ChangeAction::Returned,
            EntityKind::Sale,
            sale_id,
            Some(actor_id),
            json!({ "status": "returned" }),
            at,
        )
        .await?;

        tx.commit().await?;
        debug!(sale_id, actor_id, "Sale marked returned");
        Ok(true)
    }
}
