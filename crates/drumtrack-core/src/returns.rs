//! # Return Workflow
//!
//! A salesperson files a return request against one of their sales; an
//! admin approves it. Approval is one-way and happens at most once.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReturnRequest                                                          │
//! │                                                                         │
//! │   submit_return ──► [pending] ──approve_return──► [approved]            │
//! │                          │                             │                │
//! │                          └── approve again ───► ReturnNotPending        │
//! │                                                                         │
//! │  Sale (after each approval)                                             │
//! │                                                                         │
//! │   Σ approved ≥ sale.quantity ? [active] ──► [returned]                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity Policy
//! Under [`ReturnPolicy::Cumulative`] the pending plus approved quantity
//! across all requests for a sale never exceeds the sale's quantity.
//! [`ReturnPolicy::PerRequest`] only checks each request on its own.

use uuid::Uuid;

use crate::config::ReturnPolicy;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::events::{ChangeAction, ChangeEvent, EntityKind};
use crate::store::DrumStore;
use crate::tracker::DrumTracker;
use crate::types::{ReturnRequest, ReturnStatus, Sale};
use crate::validation::validate_id;

/// Drums on `sale` not yet covered by a pending or approved return.
///
/// `returns` may contain requests for other sales; they are ignored.
pub fn outstanding_quantity(sale: &Sale, returns: &[ReturnRequest]) -> i64 {
    let claimed: i64 = returns
        .iter()
        .filter(|r| r.is_for_sale(&sale.id))
        .map(|r| r.quantity)
        .sum();
    (sale.quantity - claimed).max(0)
}

/// Drums approved for return against `sale_id`.
pub fn approved_quantity(sale_id: &str, returns: &[ReturnRequest]) -> i64 {
    returns
        .iter()
        .filter(|r| r.is_for_sale(sale_id) && r.is_approved())
        .map(|r| r.quantity)
        .sum()
}

impl<S: DrumStore + ?Sized> DrumTracker<S> {
    /// Files a pending return request against `sale_id`.
    ///
    /// ## Errors
    /// - `Validation`: quantity < 1 or above the sale's quantity, or the
    ///   sale belongs to another salesperson
    /// - `SaleNotFound`: no such sale
    /// - `SaleAlreadyReturned`, `ExceedsOutstanding`: invalid state
    pub async fn submit_return(
        &self,
        sale_id: &str,
        salesperson_id: &str,
        quantity: i64,
    ) -> CoreResult<ReturnRequest> {
        validate_id("sale_id", sale_id)?;
        validate_id("salesperson_id", salesperson_id)?;
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let sale = self
            .store
            .get_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.salesperson_id != salesperson_id {
            return Err(ValidationError::NotOwner {
                entity: "sale".to_string(),
                id: sale.id,
                owner: salesperson_id.to_string(),
            }
            .into());
        }

        if quantity > sale.quantity {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: sale.quantity,
            }
            .into());
        }

        if sale.is_returned() {
            return Err(CoreError::SaleAlreadyReturned(sale.id));
        }

        if self.config.return_policy == ReturnPolicy::Cumulative {
            let existing = self.store.list_returns_for_sale(&sale.id).await?;
            let outstanding = outstanding_quantity(&sale, &existing);
            if quantity > outstanding {
                tracing::debug!(
                    sale_id = %sale.id,
                    outstanding,
                    requested = quantity,
                    "return exceeds outstanding quantity"
                );
                return Err(CoreError::ExceedsOutstanding {
                    sale_id: sale.id,
                    outstanding,
                    requested: quantity,
                });
            }
        }

        let request = ReturnRequest {
            id: Uuid::new_v4().to_string(),
            sale_id: Some(sale.id.clone()),
            shop_id: sale.shop_id.clone(),
            category_id: sale.category_id.clone(),
            salesperson_id: salesperson_id.to_string(),
            customer_phone: sale.customer_phone.clone(),
            quantity,
            status: ReturnStatus::Pending,
            created_at: self.clock.now(),
            processed_at: None,
            processed_by: None,
        };

        self.store.insert_return_request(&request).await?;

        tracing::info!(
            return_id = %request.id,
            sale_id = %sale.id,
            quantity,
            "return request submitted"
        );
        self.publish(ChangeEvent::new(
            EntityKind::ReturnRequest,
            &request.id,
            ChangeAction::Created,
            salesperson_id,
            request.created_at,
        ));

        Ok(request)
    }

    /// Approves a pending return request.
    ///
    /// The pending → approved transition is a conditional write, so of two
    /// concurrent approvals exactly one succeeds and the other gets
    /// `ReturnNotPending`. When approvals now cover the whole sale, the
    /// sale is marked returned.
    ///
    /// ## Errors
    /// - `ReturnNotFound`, `ReturnNotPending`
    /// - `SaleNotReconciled`: the approval is stored but the sale could not
    ///   be marked returned; call `reconcile_sale` to finish
    pub async fn approve_return(
        &self,
        return_id: &str,
        admin_id: &str,
    ) -> CoreResult<ReturnRequest> {
        validate_id("return_id", return_id)?;
        validate_id("admin_id", admin_id)?;

        let request = self
            .store
            .get_return_request(return_id)
            .await?
            .ok_or_else(|| CoreError::ReturnNotFound(return_id.to_string()))?;

        if !request.is_pending() {
            return Err(CoreError::ReturnNotPending {
                return_id: request.id,
                current_status: request.status.as_str().to_string(),
            });
        }

        let processed_at = self.clock.now();
        if !self
            .store
            .approve_return_request(return_id, admin_id, processed_at)
            .await?
        {
            tracing::warn!(return_id, "lost approval race");
            return Err(CoreError::ReturnNotPending {
                return_id: return_id.to_string(),
                current_status: ReturnStatus::Approved.as_str().to_string(),
            });
        }

        let approved = ReturnRequest {
            status: ReturnStatus::Approved,
            processed_at: Some(processed_at),
            processed_by: Some(admin_id.to_string()),
            ..request
        };

        tracing::info!(
            return_id,
            admin_id,
            quantity = approved.quantity,
            "return request approved"
        );
        self.publish(ChangeEvent::new(
            EntityKind::ReturnRequest,
            &approved.id,
            ChangeAction::Approved,
            admin_id,
            processed_at,
        ));

        if let Some(sale_id) = approved.sale_id.clone() {
            if let Err(e) = self.reconcile_sale(&sale_id, admin_id).await {
                tracing::error!(
                    return_id,
                    sale_id = %sale_id,
                    error = %e,
                    "return approved but sale status not updated"
                );
                return Err(CoreError::SaleNotReconciled {
                    approved: Box::new(approved),
                    sale_id,
                    reason: e.to_string(),
                });
            }
        }

        Ok(approved)
    }

    /// Marks `sale_id` returned if approved returns cover its quantity.
    ///
    /// Safe to call repeatedly. Returns `true` when this call changed the
    /// sale.
    pub async fn reconcile_sale(&self, sale_id: &str, actor_id: &str) -> CoreResult<bool> {
        let sale = self
            .store
            .get_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.is_returned() {
            return Ok(false);
        }

        let returns = self.store.list_returns_for_sale(sale_id).await?;
        let approved = approved_quantity(sale_id, &returns);
        if approved < sale.quantity {
            return Ok(false);
        }

        let at = self.clock.now();
        let changed = self.store.mark_sale_returned(sale_id, actor_id, at).await?;
        if changed {
            tracing::info!(sale_id, approved, "sale fully returned");
            self.publish(ChangeEvent::new(
                EntityKind::Sale,
                sale_id,
                ChangeAction::Returned,
                actor_id,
                at,
            ));
        }
        Ok(changed)
    }
}
