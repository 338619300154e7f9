//! # Audit Log Repository
//!
//! Every insert, approval and status change writes one `audit_logs` row
//! inside the same transaction as the change itself, so the trail never
//! disagrees with the data.
//!
//! ```text
//! BEGIN
//!   INSERT INTO sales ...                 ┐
//!   INSERT INTO audit_logs (created, ...) ┘ commit together or not at all
//! COMMIT
//! ```

use chrono::{DateTime, Utc};
use drumtrack_core::{ChangeAction, EntityKind};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// One row of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: String,
    /// `created`, `approved` or `returned`.
    pub action: String,
    /// `sale` or `return_request`.
    pub entity: String,
    pub reference_id: String,
    /// `None` when no user is attributed.
    pub user_id: Option<String>,
    /// JSON object with action-specific details.
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Parses `details` as JSON.
    pub fn details_json(&self) -> DbResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.details)?)
    }
}

/// Writes an audit row on `conn`, normally an open transaction.
pub(crate) async fn record(
    conn: &mut SqliteConnection,
    action: ChangeAction,
    entity: EntityKind,
    reference_id: &str,
    user_id: Option<&str>,
    details: serde_json::Value,
    at: DateTime<Utc>,
) -> DbResult<()> {
    debug!(
        action = action.as_str(),
        entity = entity.as_str(),
        reference_id,
        "Writing audit log"
    );

    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, action, entity, reference_id, user_id, details, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(action.as_str())
    .bind(entity.as_str())
    .bind(reference_id)
    .bind(user_id)
    .bind(details.to_string())
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Read side of the audit trail.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Entries for one sale or return request, oldest first.
    pub async fn list_for_reference(&self, reference_id: &str) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, action, entity, reference_id, user_id, details, created_at
            FROM audit_logs
            WHERE reference_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of audit rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
