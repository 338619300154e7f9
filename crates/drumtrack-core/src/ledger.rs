//! # Sales Ledger
//!
//! Records a customer transaction as one `Sale` row per category line.
//!
//! ## Flow
//! ```text
//! SaleOrder { customer, shop, salesperson, [line; N] }
//!     │
//!     ├── validate_sale_order      (shape: names, phone, quantities)
//!     ├── check references         (shop, salesperson, categories exist)
//!     ├── plan_sales               (N rows, one created_at, due = +30d)
//!     └── insert line 0 .. N-1     (stop at the first failure)
//!             │
//!             ├── all ok        ──► Ok(rows)
//!             ├── line 0 fails  ──► Persistence
//!             └── line k fails  ──► PartialSale { inserted: lines 0..k }
//! ```
//!
//! Lines are not inserted atomically; a failure partway through leaves the
//! earlier lines in place and reports exactly which ones.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::events::{ChangeAction, ChangeEvent, EntityKind};
use crate::store::DrumStore;
use crate::tracker::DrumTracker;
use crate::types::{due_date_for, Sale, SaleOrder, SaleStatus};
use crate::validation::{validate_line_total, validate_sale_order, ValidationResult};

/// Builds the sale rows for `order` without touching the store.
///
/// Every row gets the same `created_at` and `due_date`. Customer fields are
/// trimmed and a blank address becomes `None`. Fails only when a line total
/// does not fit in `Money`.
pub fn plan_sales<F>(
    order: &SaleOrder,
    created_at: DateTime<Utc>,
    mut new_id: F,
) -> ValidationResult<Vec<Sale>>
where
    F: FnMut() -> String,
{
    let customer_name = order.customer.name.trim().to_string();
    let customer_phone = order.customer.phone.trim().to_string();
    let customer_address = order
        .customer
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    let due_date = due_date_for(created_at);

    order
        .line_items
        .iter()
        .map(|line| {
            let unit_price = line.unit_price();
            let total_amount = validate_line_total(unit_price, line.quantity)?;
            Ok(Sale {
                id: new_id(),
                customer_name: customer_name.clone(),
                customer_phone: customer_phone.clone(),
                customer_address: customer_address.clone(),
                shop_id: order.shop_id.clone(),
                salesperson_id: order.salesperson_id.clone(),
                category_id: line.category_id.clone(),
                quantity: line.quantity,
                unit_price,
                total_amount,
                created_at,
                due_date,
                status: SaleStatus::Active,
            })
        })
        .collect()
}

impl<S: DrumStore + ?Sized> DrumTracker<S> {
    /// Records a sale: one `Sale` row per line item.
    ///
    /// ## Errors
    /// - `Validation`: empty line list, bad quantity, unknown shop,
    ///   salesperson or category
    /// - `Persistence`: the first insert failed (nothing was written)
    /// - `PartialSale`: a later insert failed; earlier lines were written
    pub async fn record_sale(&self, order: SaleOrder) -> CoreResult<Vec<Sale>> {
        validate_sale_order(
            &order,
            self.config.max_line_items,
            self.config.max_line_quantity,
        )?;
        self.check_references(&order).await?;

        let rows = plan_sales(&order, self.clock.now(), || Uuid::new_v4().to_string())?;
        let mut inserted: Vec<Sale> = Vec::with_capacity(rows.len());

        for (line, sale) in rows.into_iter().enumerate() {
            if let Err(e) = self.store.insert_sale(&sale).await {
                if inserted.is_empty() {
                    tracing::error!(error = %e, "sale insert failed");
                    return Err(e.into());
                }

                tracing::error!(
                    failed_line = line,
                    inserted = inserted.len(),
                    error = %e,
                    "sale recorded partially"
                );
                return Err(CoreError::PartialSale {
                    inserted: inserted.into_iter().map(|s| s.id).collect(),
                    failed_line: line,
                    reason: e.to_string(),
                });
            }

            self.publish(ChangeEvent::new(
                EntityKind::Sale,
                &sale.id,
                ChangeAction::Created,
                &order.salesperson_id,
                sale.created_at,
            ));
            inserted.push(sale);
        }

        tracing::info!(
            salesperson_id = %order.salesperson_id,
            shop_id = %order.shop_id,
            lines = inserted.len(),
            drums = inserted.iter().map(|s| s.quantity).sum::<i64>(),
            "sale recorded"
        );
        Ok(inserted)
    }

    async fn check_references(&self, order: &SaleOrder) -> CoreResult<()> {
        let shops = self.store.list_shops().await?;
        if !shops.iter().any(|s| s.id == order.shop_id) {
            return Err(ValidationError::unknown("shop", &order.shop_id).into());
        }

        if self.store.get_profile(&order.salesperson_id).await?.is_none() {
            return Err(ValidationError::unknown("salesperson", &order.salesperson_id).into());
        }

        let categories = self.store.list_categories().await?;
        let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        if let Some(line) = order
            .line_items
            .iter()
            .find(|l| !known.contains(l.category_id.as_str()))
        {
            return Err(ValidationError::unknown("category", &line.category_id).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorKind;
    use crate::events::RecordingSink;
    use crate::memory::MemoryStore;
    use crate::money::Money;
    use crate::types::{CustomerInfo, LineItem, Role};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_category("cat-a", "Love White")
                .with_category("cat-b", "Mango White")
                .with_category("cat-c", "SOS White")
                .with_shop("shop-1", "Westlands")
                .with_profile("sp-1", "Amani", Role::Salesperson),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 14, 30, 0).unwrap()
    }

    fn order(lines: Vec<LineItem>) -> SaleOrder {
        SaleOrder {
            customer: CustomerInfo {
                name: "  Jane Wanjiku ".to_string(),
                phone: "+254 700 000 001".to_string(),
                address: Some("   ".to_string()),
            },
            shop_id: "shop-1".to_string(),
            salesperson_id: "sp-1".to_string(),
            line_items: lines,
        }
    }

    #[test]
    fn test_plan_sales() {
        let mut next = 0;
        let rows = plan_sales(
            &order(vec![
                LineItem::new("cat-a", 2).priced(Money::from_cents(1500)),
                LineItem::new("cat-b", 1),
            ]),
            now(),
            || {
                next += 1;
                format!("sale-{next}")
            },
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "sale-1");
        assert_eq!(rows[1].id, "sale-2");
        assert_eq!(rows[0].customer_name, "Jane Wanjiku");
        assert_eq!(rows[0].customer_address, None);
        assert_eq!(rows[0].total_amount, Money::from_cents(3000));
        assert_eq!(rows[1].unit_price, Money::zero());
        assert_eq!(rows[1].total_amount, Money::zero());
        assert!(rows.iter().all(|r| r.due_date == now() + Duration::days(30)));
    }

    #[tokio::test]
    async fn test_record_sale_one_row_per_line() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = DrumTracker::new(store())
            .with_clock(Arc::new(FixedClock::new(now())))
            .with_changes(sink.clone());

        let rows = tracker
            .record_sale(order(vec![
                LineItem::new("cat-a", 2).priced(Money::from_cents(2000)),
                LineItem::new("cat-b", 1).priced(Money::from_cents(2500)),
                LineItem::new("cat-c", 4),
            ]))
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(tracker.store().sale_count(), 3);
        for row in &rows {
            assert_eq!(row.created_at, now());
            assert_eq!(row.due_date, now() + Duration::days(30));
            assert_eq!(row.status, SaleStatus::Active);
            assert_eq!(
                Some(row.total_amount),
                row.unit_price.checked_multiply_quantity(row.quantity)
            );
        }
        assert_eq!(rows[0].total_amount, Money::from_cents(4000));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| e.entity == EntityKind::Sale && e.action == ChangeAction::Created));
    }

    #[tokio::test]
    async fn test_two_line_order_feeds_dashboard_aggregates() {
        let store = Arc::new(
            MemoryStore::new()
                .with_category("cat-a", "A")
                .with_category("cat-b", "B")
                .with_shop("shop-1", "Westlands")
                .with_profile("sp-1", "Amani", Role::Salesperson),
        );
        let tracker = DrumTracker::new(store.clone()).with_clock(Arc::new(FixedClock::new(now())));

        let rows = tracker
            .record_sale(SaleOrder {
                customer: CustomerInfo {
                    name: "Jane".to_string(),
                    phone: "+1555".to_string(),
                    address: None,
                },
                shop_id: "shop-1".to_string(),
                salesperson_id: "sp-1".to_string(),
                line_items: vec![
                    LineItem::new("cat-a", 2).priced(Money::from_cents(10)),
                    LineItem::new("cat-b", 1).priced(Money::from_cents(5)),
                ],
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.created_at == now()));
        assert!(rows.iter().all(|r| r.due_date == now() + Duration::days(30)));
        assert_eq!(rows[0].total_amount, Money::from_cents(20));
        assert_eq!(rows[1].total_amount, Money::from_cents(5));

        let stored = store.list_sales(None).await.unwrap();
        let categories = store.list_categories().await.unwrap();
        let by_product = crate::stats::sales_by_product(&stored, &categories);
        assert_eq!(
            by_product.into_iter().collect::<Vec<_>>(),
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
        assert_eq!(crate::stats::unique_customer_count(&stored), 1);
    }

    #[tokio::test]
    async fn test_record_sale_rejects_bad_input() {
        let tracker = DrumTracker::new(store()).with_clock(Arc::new(FixedClock::new(now())));

        let err = tracker.record_sale(order(vec![])).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Empty { .. })
        ));

        let err = tracker
            .record_sale(order(vec![LineItem::new("cat-a", 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = tracker
            .record_sale(order(vec![LineItem::new("cat-a", 1), LineItem::new("cat-z", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnknownReference { ref entity, .. })
                if entity == "category"
        ));

        let mut wrong_shop = order(vec![LineItem::new("cat-a", 1)]);
        wrong_shop.shop_id = "shop-9".to_string();
        let err = tracker.record_sale(wrong_shop).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut stranger = order(vec![LineItem::new("cat-a", 1)]);
        stranger.salesperson_id = "sp-9".to_string();
        let err = tracker.record_sale(stranger).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(tracker.store().sale_count(), 0);
    }

    #[tokio::test]
    async fn test_record_sale_rejects_overflowing_price() {
        let tracker = DrumTracker::new(store()).with_clock(Arc::new(FixedClock::new(now())));

        let err = tracker
            .record_sale(order(vec![
                LineItem::new("cat-a", 3).priced(Money::from_cents(i64::MAX / 2))
            ]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. })
                if field == "unit_price"
        ));
        assert_eq!(tracker.store().sale_count(), 0);

        let planned = plan_sales(
            &order(vec![LineItem::new("cat-a", 3).priced(Money::from_cents(i64::MAX / 2))]),
            now(),
            || "sale-1".to_string(),
        );
        assert!(planned.is_err());
    }

    #[tokio::test]
    async fn test_partial_failure_reports_inserted_lines() {
        let store = store();
        let tracker = DrumTracker::new(store.clone()).with_clock(Arc::new(FixedClock::new(now())));
        store.fail_sale_inserts_after(1);

        let full = order(vec![
            LineItem::new("cat-a", 1),
            LineItem::new("cat-b", 1),
            LineItem::new("cat-c", 1),
        ]);
        let err = tracker.record_sale(full.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(!err.is_retryable());

        let failed_line = match err {
            CoreError::PartialSale {
                inserted,
                failed_line,
                ..
            } => {
                assert_eq!(inserted.len(), 1);
                assert_eq!(failed_line, 1);
                let stored = store.list_sales(None).await.unwrap();
                assert_eq!(stored[0].id, inserted[0]);
                failed_line
            }
            other => panic!("expected PartialSale, got {other:?}"),
        };
        assert_eq!(store.sale_count(), 1);

        // Resubmitting only the remaining lines completes the order once.
        store.fail_sale_inserts_after(usize::MAX);
        let mut rest = full;
        rest.line_items.drain(..failed_line);
        tracker.record_sale(rest).await.unwrap();

        let stored = store.list_sales(None).await.unwrap();
        let mut categories: Vec<&str> = stored.iter().map(|s| s.category_id.as_str()).collect();
        categories.sort_unstable();
        assert_eq!(categories, vec!["cat-a", "cat-b", "cat-c"]);
    }

    #[tokio::test]
    async fn test_first_line_failure_is_plain_persistence() {
        let store = store();
        let tracker = DrumTracker::new(store.clone()).with_clock(Arc::new(FixedClock::new(now())));
        store.fail_sale_inserts_after(0);

        let err = tracker
            .record_sale(order(vec![LineItem::new("cat-a", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(err.is_retryable());
    }
}
