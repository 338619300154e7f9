//! # Domain Types
//!
//! Core domain types used throughout drumtrack.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data (immutable)        Transactional rows                  │
//! │  ┌──────────────┐ ┌──────────┐     ┌──────────────────────────────┐    │
//! │  │ DrumCategory │ │   Shop   │     │ Sale (one per line item)     │    │
//! │  │  id, name    │ │ id, name │     │  customer_*, shop, category  │    │
//! │  └──────────────┘ └──────────┘     │  quantity × unit_price       │    │
//! │  ┌──────────────────────────┐      │  created_at, due_date (+30d) │    │
//! │  │ Profile                  │      │  status: active | returned   │    │
//! │  │  id (= user id), name,   │      └──────────────┬───────────────┘    │
//! │  │  email, role             │                     │ sale_id            │
//! │  └──────────────────────────┘      ┌──────────────▼───────────────┐    │
//! │                                    │ ReturnRequest                │    │
//! │                                    │  quantity, pending|approved  │    │
//! │                                    │  processed_at / processed_by │    │
//! │                                    └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row shapes match the store's `sales` and `return_requests` tables
//! field-for-field. "Overdue" is never stored; see [`crate::status`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::RETURN_WINDOW_DAYS;

// =============================================================================
// Reference Data
// =============================================================================

/// A drum product category ("Love White", "Mango White", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DrumCategory {
    pub id: String,
    pub name: String,
}

/// A shop drums are sold through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Users
// =============================================================================

/// Capability of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    StoreManager,
    Salesperson,
}

impl Role {
    /// Admins and store managers see every salesperson's records.
    pub const fn sees_all(&self) -> bool {
        matches!(self, Role::Admin | Role::StoreManager)
    }
}

/// A salesperson or admin profile. `id` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Sale
// =============================================================================

/// Stored status of a sale.
///
/// There is no `Overdue` variant: overdue is derived at read
/// time from `due_date` and the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Drums are with the customer.
    Active,
    /// The full quantity has been approved as returned.
    Returned,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Returned => "returned",
        }
    }
}

/// One category line of drums sold to a customer.
///
/// A customer transaction with N categories produces N `Sale` rows that
/// share customer, shop, salesperson and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub shop_id: String,
    pub salesperson_id: String,
    pub category_id: String,
    /// Drums sold on this line (> 0).
    pub quantity: i64,
    /// Price per drum (>= 0).
    pub unit_price: Money,
    /// quantity × unit_price, fixed at creation.
    pub total_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// created_at + 30 days, never mutated.
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub status: SaleStatus,
}

impl Sale {
    #[inline]
    pub fn is_returned(&self) -> bool {
        self.status == SaleStatus::Returned
    }
}

/// Return deadline for a sale created at `created_at`.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use drumtrack_core::types::due_date_for;
///
/// let sold = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
/// let due = due_date_for(sold);
/// assert_eq!(due, Utc.with_ymd_and_hms(2026, 2, 14, 9, 0, 0).unwrap());
/// ```
pub fn due_date_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(RETURN_WINDOW_DAYS)
}

// =============================================================================
// Return Request
// =============================================================================

/// Approval status of a return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
}

impl ReturnStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
        }
    }
}

/// A salesperson's claim that drums from a sale came back.
///
/// `processed_at` / `processed_by` are set only when an admin approves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReturnRequest {
    pub id: String,
    /// Originating sale; nullable in the store for legacy rows.
    pub sale_id: Option<String>,
    pub shop_id: String,
    pub category_id: String,
    pub salesperson_id: String,
    pub customer_phone: String,
    pub quantity: i64,
    pub status: ReturnStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
}

impl ReturnRequest {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == ReturnStatus::Pending
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == ReturnStatus::Approved
    }

    /// Whether this request was filed against `sale_id`.
    pub fn is_for_sale(&self, sale_id: &str) -> bool {
        self.sale_id.as_deref() == Some(sale_id)
    }
}

// =============================================================================
// Sale Input
// =============================================================================

/// Customer details captured on the sale form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

/// One category line of a new sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub category_id: String,
    pub quantity: i64,
    /// Defaults to zero when the form omits pricing.
    pub unit_price: Option<Money>,
}

impl LineItem {
    pub fn new(category_id: impl Into<String>, quantity: i64) -> Self {
        LineItem {
            category_id: category_id.into(),
            quantity,
            unit_price: None,
        }
    }

    pub fn priced(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    /// The effective unit price (zero when unset).
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.unit_price.unwrap_or_default()
    }
}

/// A complete sale submission: one customer, one shop, N lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleOrder {
    pub customer: CustomerInfo,
    pub shop_id: String,
    pub salesperson_id: String,
    pub line_items: Vec<LineItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_due_date_is_thirty_days_later() {
        let sold = Utc.with_ymd_and_hms(2026, 12, 15, 23, 59, 59).unwrap();
        let due = due_date_for(sold);
        assert_eq!(due - sold, Duration::days(30));
        assert_eq!(due, Utc.with_ymd_and_hms(2027, 1, 14, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Active);
        assert_eq!(SaleStatus::Returned.as_str(), "returned");
    }

    #[test]
    fn test_role_visibility() {
        assert!(Role::Admin.sees_all());
        assert!(Role::StoreManager.sees_all());
        assert!(!Role::Salesperson.sees_all());
    }

    #[test]
    fn test_line_item_price_defaults_to_zero() {
        let line = LineItem::new("cat-1", 3);
        assert!(line.unit_price().is_zero());

        let priced = LineItem::new("cat-1", 3).priced(Money::from_cents(250));
        assert_eq!(priced.unit_price().cents(), 250);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ReturnStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
    }
}
