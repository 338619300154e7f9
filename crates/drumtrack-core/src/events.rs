//! # Change Events
//!
//! After every successful mutation the core publishes a [`ChangeEvent`]
//! naming the entity and id that changed. Delivering it (websocket,
//! query-cache invalidation, push notification) is up to the sink.
//!
//! ```text
//! record_sale ──────► ChangeEvent { Sale, id, Created }        × N lines
//! submit_return ────► ChangeEvent { ReturnRequest, id, Created }
//! approve_return ───► ChangeEvent { ReturnRequest, id, Approved }
//!                 └─► ChangeEvent { Sale, sale_id, Returned }   (fully returned)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Mutex};
use ts_rs::TS;

/// Which table a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sale,
    ReturnRequest,
}

impl EntityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Sale => "sale",
            EntityKind::ReturnRequest => "return_request",
        }
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Approved,
    Returned,
}

impl ChangeAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Approved => "approved",
            ChangeAction::Returned => "returned",
        }
    }
}

/// A "this changed" fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChangeEvent {
    pub entity: EntityKind,
    pub entity_id: String,
    pub action: ChangeAction,
    /// User whose action caused the change.
    pub actor_id: String,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        entity: EntityKind,
        entity_id: impl Into<String>,
        action: ChangeAction,
        actor_id: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        ChangeEvent {
            entity,
            entity_id: entity_id.into(),
            action,
            actor_id: actor_id.into(),
            occurred_at,
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of change events. Publishing must not fail the mutation.
pub trait ChangeSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Discards every event.
impl ChangeSink for () {
    fn publish(&self, _event: ChangeEvent) {}
}

impl<F> ChangeSink for F
where
    F: Fn(ChangeEvent) + Send + Sync,
{
    fn publish(&self, event: ChangeEvent) {
        self(event)
    }
}

/// Forwards to a channel; a dropped receiver is ignored.
impl ChangeSink for Mutex<mpsc::Sender<ChangeEvent>> {
    fn publish(&self, event: ChangeEvent) {
        let sender = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if sender.send(event).is_err() {
            tracing::debug!("change event receiver dropped");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Removes and returns everything published so far.
    pub fn take(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

impl ChangeSink for RecordingSink {
    fn publish(&self, event: ChangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
