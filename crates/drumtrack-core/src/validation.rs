//! # Validation Module
//!
//! Input validation for sale and return submissions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard form (external)                                    │
//! │  └── required fields, min="1" on quantity inputs                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (shape checks, no store access)                  │
//! │  ├── non-empty names/phones/ids                                        │
//! │  └── quantity and price ranges                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: ledger / return workflow (reference checks via DrumStore)    │
//! │  └── shop, salesperson, category, sale exist                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (NOT NULL, CHECK, FOREIGN KEY)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use drumtrack_core::validation::{validate_phone, validate_quantity};
//!
//! validate_phone("+254700000000").unwrap();
//! validate_quantity(5, 999).unwrap();
//! assert!(validate_quantity(0, 999).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::SaleOrder;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a customer name: non-empty, at most 200 characters.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required("customer_name", name, MAX_NAME_LEN)
}

/// Validates a customer phone number.
///
/// ## Rules
/// - Must not be empty (the phone number is the customer's identity)
/// - At most 32 characters
/// - Digits, spaces, `+`, `-`, `(`, `)` only
///
/// ## Example
/// ```rust
/// use drumtrack_core::validation::validate_phone;
///
/// assert!(validate_phone("+1 (555) 010-2030").is_ok());
/// assert!(validate_phone("").is_err());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required("customer_phone", phone, MAX_PHONE_LEN)?;

    if !phone
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain only digits, spaces, and + - ( )".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional customer address (blank counts as absent).
pub fn validate_address(address: Option<&str>) -> ValidationResult<()> {
    match address.map(str::trim) {
        Some(a) if a.chars().count() > MAX_ADDRESS_LEN => Err(ValidationError::TooLong {
            field: "customer_address".to_string(),
            max: MAX_ADDRESS_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates that an identifier field is present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a drum quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed `max`
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (unpriced drums).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Checks that `quantity × unit_price` fits in the total column.
pub fn validate_line_total(price: Money, qty: i64) -> ValidationResult<Money> {
    price
        .checked_multiply_quantity(qty)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX / qty.max(1),
        })
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Shape-checks a sale submission before any store lookups.
///
/// Reference checks (does the shop exist?) happen in the ledger.
pub fn validate_sale_order(
    order: &SaleOrder,
    max_line_items: usize,
    max_line_quantity: i64,
) -> ValidationResult<()> {
    validate_customer_name(&order.customer.name)?;
    validate_phone(&order.customer.phone)?;
    validate_address(order.customer.address.as_deref())?;
    validate_id("shop_id", &order.shop_id)?;
    validate_id("salesperson_id", &order.salesperson_id)?;

    if order.line_items.is_empty() {
        return Err(ValidationError::Empty {
            field: "line_items".to_string(),
        });
    }

    if order.line_items.len() > max_line_items {
        return Err(ValidationError::OutOfRange {
            field: "line_items".to_string(),
            min: 1,
            max: max_line_items as i64,
        });
    }

    let mut order_total = Money::zero();
    for line in &order.line_items {
        validate_id("category_id", &line.category_id)?;
        validate_quantity(line.quantity, max_line_quantity)?;
        validate_unit_price(line.unit_price())?;
        let line_total = validate_line_total(line.unit_price(), line.quantity)?;
        order_total =
            order_total
                .checked_add(line_total)
                .ok_or_else(|| ValidationError::OutOfRange {
                    field: "total_amount".to_string(),
                    min: 0,
                    max: i64::MAX,
                })?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomerInfo, LineItem};

    fn order(lines: Vec<LineItem>) -> SaleOrder {
        SaleOrder {
            customer: CustomerInfo {
                name: "Jane".to_string(),
                phone: "+1555".to_string(),
                address: None,
            },
            shop_id: "shop-1".to_string(),
            salesperson_id: "sp-1".to_string(),
            line_items: lines,
        }
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Jane Wanjiru").is_ok());
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+254 712 345678").is_ok());
        assert!(validate_phone("0712-345-678").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("phone").is_err());
        assert!(validate_phone(&"1".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 999).is_ok());
        assert!(validate_quantity(999, 999).is_ok());
        assert!(validate_quantity(0, 999).is_err());
        assert!(validate_quantity(-1, 999).is_err());
        assert!(validate_quantity(1000, 999).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_cents(1099)).is_ok());
        assert!(validate_unit_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_sale_order() {
        assert!(validate_sale_order(&order(vec![LineItem::new("cat-1", 2)]), 100, 999).is_ok());

        let err = validate_sale_order(&order(vec![]), 100, 999).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));

        let err = validate_sale_order(&order(vec![LineItem::new("cat-1", 0)]), 100, 999)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));

        let too_many = (0..3).map(|i| LineItem::new(format!("c{i}"), 1)).collect();
        assert!(validate_sale_order(&order(too_many), 2, 999).is_err());

        let negative = LineItem::new("cat-1", 1).priced(Money::from_cents(-5));
        assert!(validate_sale_order(&order(vec![negative]), 100, 999).is_err());
    }

    #[test]
    fn test_overflowing_totals_are_out_of_range() {
        let huge = Money::from_cents(i64::MAX / 2);

        let one_line = vec![LineItem::new("cat-1", 3).priced(huge)];
        let err = validate_sale_order(&order(one_line), 100, 999).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { ref field, .. } if field == "unit_price"
        ));

        let two_lines = vec![
            LineItem::new("cat-1", 1).priced(huge),
            LineItem::new("cat-2", 1).priced(huge),
            LineItem::new("cat-3", 1).priced(Money::from_cents(2)),
        ];
        let err = validate_sale_order(&order(two_lines), 100, 999).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { ref field, .. } if field == "total_amount"
        ));

        assert_eq!(
            validate_line_total(Money::from_cents(1000), 2).unwrap(),
            Money::from_cents(2000)
        );
    }
}
