//! Printable receipt data for one customer transaction.
//!
//! A transaction is the set of `Sale` rows created together by one
//! `record_sale` call. Layout and printing belong to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stats::UNKNOWN_CATEGORY;
use crate::store::DrumStore;
use crate::tracker::DrumTracker;
use crate::types::{DrumCategory, Profile, Sale, Shop};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub category_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub shop_name: String,
    pub salesperson_name: String,
    pub lines: Vec<ReceiptLine>,
    pub total_quantity: i64,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    /// Drums must be back by this date.
    #[ts(as = "String")]
    pub return_by: DateTime<Utc>,
}

/// Assembles a receipt from the rows of one transaction.
///
/// Fails with a validation error when `sales` is empty or the rows do not
/// share customer, shop, salesperson and `created_at`.
pub fn build_receipt(
    sales: &[Sale],
    categories: &[DrumCategory],
    shop: Option<&Shop>,
    salesperson: Option<&Profile>,
) -> CoreResult<SaleReceipt> {
    let first = sales.first().ok_or_else(|| ValidationError::Empty {
        field: "sales".to_string(),
    })?;

    let same_transaction = sales.iter().all(|s| {
        s.customer_phone == first.customer_phone
            && s.shop_id == first.shop_id
            && s.salesperson_id == first.salesperson_id
            && s.created_at == first.created_at
    });
    if !same_transaction {
        return Err(ValidationError::InvalidFormat {
            field: "sales".to_string(),
            reason: "rows belong to different transactions".to_string(),
        }
        .into());
    }

    let lines: Vec<ReceiptLine> = sales
        .iter()
        .map(|s| ReceiptLine {
            category_name: categories
                .iter()
                .find(|c| c.id == s.category_id)
                .map_or_else(|| UNKNOWN_CATEGORY.to_string(), |c| c.name.clone()),
            quantity: s.quantity,
            unit_price: s.unit_price,
            line_total: s.total_amount,
        })
        .collect();

    let total_amount = Money::checked_sum(lines.iter().map(|l| l.line_total)).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "total_amount".to_string(),
            min: 0,
            max: i64::MAX,
        }
    })?;

    Ok(SaleReceipt {
        customer_name: first.customer_name.clone(),
        customer_phone: first.customer_phone.clone(),
        customer_address: first.customer_address.clone(),
        shop_name: shop.map_or_else(|| first.shop_id.clone(), |s| s.name.clone()),
        salesperson_name: salesperson
            .map_or_else(|| first.salesperson_id.clone(), |p| p.name.clone()),
        total_quantity: lines.iter().map(|l| l.quantity).sum(),
        total_amount,
        lines,
        sale_date: first.created_at,
        return_by: first.due_date,
    })
}

impl<S: DrumStore + ?Sized> DrumTracker<S> {
    /// Receipt for the rows returned by `record_sale`.
    pub async fn receipt(&self, sales: &[Sale]) -> CoreResult<SaleReceipt> {
        let first = sales.first().ok_or_else(|| {
            CoreError::from(ValidationError::Empty {
                field: "sales".to_string(),
            })
        })?;

        let categories = self.store.list_categories().await?;
        let shops = self.store.list_shops().await?;
        let salesperson = self.store.get_profile(&first.salesperson_id).await?;
        let shop = shops.iter().find(|s| s.id == first.shop_id);

        build_receipt(sales, &categories, shop, salesperson.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;
    use crate::types::{CustomerInfo, LineItem, Role, SaleOrder};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_receipt_for_recorded_sale() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let store = Arc::new(
            MemoryStore::new()
                .with_category("cat-a", "Love White")
                .with_category("cat-b", "Mango White")
                .with_shop("shop-1", "Westlands")
                .with_profile("sp-1", "Amani", Role::Salesperson),
        );
        let tracker = DrumTracker::new(store).with_clock(Arc::new(FixedClock::new(now)));

        let sales = tracker
            .record_sale(SaleOrder {
                customer: CustomerInfo {
                    name: "Jane".to_string(),
                    phone: "+1555".to_string(),
                    address: Some("Kilimani".to_string()),
                },
                shop_id: "shop-1".to_string(),
                salesperson_id: "sp-1".to_string(),
                line_items: vec![
                    LineItem::new("cat-a", 2).priced(Money::from_cents(1250)),
                    LineItem::new("cat-b", 3),
                ],
            })
            .await
            .unwrap();

        let receipt = tracker.receipt(&sales).await.unwrap();
        assert_eq!(receipt.shop_name, "Westlands");
        assert_eq!(receipt.salesperson_name, "Amani");
        assert_eq!(receipt.lines[0].category_name, "Love White");
        assert_eq!(receipt.lines[1].category_name, "Mango White");
        assert_eq!(receipt.total_quantity, 5);
        assert_eq!(receipt.total_amount, Money::from_cents(2500));
        assert_eq!(receipt.return_by, now + Duration::days(30));
    }

    #[test]
    fn test_receipt_rejects_mixed_rows() {
        assert!(build_receipt(&[], &[], None, None).is_err());

        let t = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let sale = |id: &str, phone: &str| Sale {
            id: id.into(),
            customer_name: "Jane".into(),
            customer_phone: phone.into(),
            customer_address: None,
            shop_id: "shop-1".into(),
            salesperson_id: "sp-1".into(),
            category_id: "cat-x".into(),
            quantity: 1,
            unit_price: Money::zero(),
            total_amount: Money::zero(),
            created_at: t,
            due_date: t + Duration::days(30),
            status: Default::default(),
        };

        let err = build_receipt(&[sale("a", "+1"), sale("b", "+2")], &[], None, None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        let receipt = build_receipt(&[sale("a", "+1")], &[], None, None).unwrap();
        assert_eq!(receipt.lines[0].category_name, UNKNOWN_CATEGORY);
        assert_eq!(receipt.shop_name, "shop-1");
    }
}
