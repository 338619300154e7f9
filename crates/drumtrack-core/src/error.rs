//! # Error Types
//!
//! Domain-specific error types for drumtrack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  drumtrack-core errors (this file)                                     │
//! │  ├── CoreError        - Everything a core operation can fail with      │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - What a DrumStore implementation may return     │
//! │                                                                         │
//! │  drumtrack-db errors (separate crate)                                  │
//! │  └── DbError          - sqlx failures, mapped into StoreError          │
//! │                                                                         │
//! │  Flow: sqlx::Error → DbError → StoreError → CoreError → caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers branch on [`CoreError::kind`]: validation and invalid-state
//! failures are shown as actionable messages, persistence failures as a
//! generic failure that may be retried.

use serde::Serialize;
use thiserror::Error;

use crate::types::ReturnRequest;

// =============================================================================
// Error Kind
// =============================================================================

/// The four failure classes every core operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// A referenced sale or return request does not exist.
    NotFound,
    /// The requested transition is illegal in the current state.
    InvalidState,
    /// The store failed; nothing about the input was wrong.
    Persistence,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Return request not found.
    #[error("Return request not found: {0}")]
    ReturnNotFound(String),

    /// Salesperson profile not found.
    #[error("Salesperson not found: {0}")]
    SalespersonNotFound(String),

    /// Return request is not pending, so it cannot be approved.
    ///
    /// ## When This Occurs
    /// - Approving the same request twice
    /// - Two admins approving concurrently; the loser sees this
    #[error("Return request {return_id} is {current_status}, cannot approve")]
    ReturnNotPending {
        return_id: String,
        current_status: String,
    },

    /// Sale has already been fully returned.
    #[error("Sale {0} is already returned")]
    SaleAlreadyReturned(String),

    /// Return quantity exceeds what is still outstanding on the sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale: 5 drums
    ///   Return #1: 3 drums (pending)   → outstanding 2
    ///   Return #2: 3 drums             → ExceedsOutstanding { outstanding: 2, requested: 3 }
    /// ```
    #[error("Sale {sale_id} has {outstanding} drums outstanding, cannot return {requested}")]
    ExceedsOutstanding {
        sale_id: String,
        outstanding: i64,
        requested: i64,
    },

    /// The store failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A multi-line sale failed partway through.
    ///
    /// Lines before `failed_line` were inserted and are NOT rolled back;
    /// their ids are listed in `inserted`. Resubmitting the whole order
    /// would record those lines twice, so this is not retryable as-is: only
    /// `line_items[failed_line..]` may be submitted again.
    #[error(
        "Sale recorded partially: {} line(s) inserted, line {failed_line} failed: {reason}",
        inserted.len()
    )]
    PartialSale {
        inserted: Vec<String>,
        failed_line: usize,
        reason: String,
    },

    /// A return was approved but the sale's status could not be updated.
    ///
    /// The approval is committed and `approved` is the stored request. The
    /// sale stays active until
    /// [`reconcile_sale`](crate::tracker::DrumTracker::reconcile_sale)
    /// succeeds for `sale_id`.
    #[error("Return {} approved, but sale {sale_id} was not updated: {reason}", approved.id)]
    SaleNotReconciled {
        approved: Box<ReturnRequest>,
        sale_id: String,
        reason: String,
    },
}

impl CoreError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::SaleNotFound(_)
            | CoreError::ReturnNotFound(_)
            | CoreError::SalespersonNotFound(_) => ErrorKind::NotFound,
            CoreError::ReturnNotPending { .. }
            | CoreError::SaleAlreadyReturned(_)
            | CoreError::ExceedsOutstanding { .. } => ErrorKind::InvalidState,
            CoreError::Persistence(_)
            | CoreError::PartialSale { .. }
            | CoreError::SaleNotReconciled { .. } => ErrorKind::Persistence,
        }
    }

    /// Whether a caller may repeat the same call.
    ///
    /// Only a plain store failure qualifies. Retrying bad input or an
    /// illegal transition gives the same answer, and the two partial
    /// outcomes already wrote something: `PartialSale` is retried with the
    /// remaining lines, `SaleNotReconciled` with `reconcile_sale`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Persistence(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any store write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a phone number with letters, or receipt rows
    /// from different transactions).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that needs at least one entry is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// An id does not reference an existing record.
    #[error("Unknown {entity}: {id}")]
    UnknownReference { entity: String, id: String },

    /// The actor may not act on this record.
    #[error("{entity} {id} does not belong to {owner}")]
    NotOwner {
        entity: String,
        id: String,
        owner: String,
    },
}

impl ValidationError {
    /// Creates an UnknownReference error.
    pub fn unknown(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ValidationError::UnknownReference {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a [`DrumStore`](crate::store::DrumStore) implementation.
///
/// Store implementations translate their native errors into this type so
/// nothing backend-specific reaches the core's callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A read or write was rejected or failed.
    #[error("store operation failed: {0}")]
    Operation(String),

    /// A constraint (unique, foreign key) rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ExceedsOutstanding {
            sale_id: "s-1".to_string(),
            outstanding: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Sale s-1 has 2 drums outstanding, cannot return 3"
        );

        let err = CoreError::PartialSale {
            inserted: vec!["a".to_string()],
            failed_line: 1,
            reason: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sale recorded partially: 1 line(s) inserted, line 1 failed: disk full"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::unknown("shop", "shop-9");
        assert_eq!(err.to_string(), "Unknown shop: shop-9");
    }

    #[test]
    fn test_kinds() {
        let validation: CoreError = ValidationError::Empty {
            field: "line_items".to_string(),
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert!(!validation.is_retryable());

        assert_eq!(
            CoreError::ReturnNotFound("r".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::ReturnNotPending {
                return_id: "r".into(),
                current_status: "approved".into()
            }
            .kind(),
            ErrorKind::InvalidState
        );

        let store: CoreError = StoreError::Unavailable("pool closed".into()).into();
        assert_eq!(store.kind(), ErrorKind::Persistence);
        assert!(store.is_retryable());
    }

    #[test]
    fn test_partial_outcomes_are_not_retryable() {
        use chrono::{TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let partial = CoreError::PartialSale {
            inserted: vec!["a".to_string()],
            failed_line: 1,
            reason: "disk full".to_string(),
        };
        assert_eq!(partial.kind(), ErrorKind::Persistence);
        assert!(!partial.is_retryable());

        let stale = CoreError::SaleNotReconciled {
            approved: Box::new(ReturnRequest {
                id: "r-1".to_string(),
                sale_id: Some("s-1".to_string()),
                shop_id: "shop-1".to_string(),
                category_id: "cat-a".to_string(),
                salesperson_id: "sp-1".to_string(),
                customer_phone: "+1555".to_string(),
                quantity: 2,
                status: crate::types::ReturnStatus::Approved,
                created_at: at,
                processed_at: Some(at),
                processed_by: Some("admin".to_string()),
            }),
            sale_id: "s-1".to_string(),
            reason: "locked".to_string(),
        };
        assert_eq!(stale.kind(), ErrorKind::Persistence);
        assert!(!stale.is_retryable());
        assert_eq!(
            stale.to_string(),
            "Return r-1 approved, but sale s-1 was not updated: locked"
        );
    }
}
