//! # drumtrack-core: Business Logic for Drum Sales Tracking
//!
//! This crate is the **heart** of drumtrack. It owns the sales ledger, the
//! return-approval workflow, overdue resolution, and dashboard aggregation.
//! Storage is reached only through the [`store::DrumStore`] port.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        drumtrack Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboards (admin / salesperson UI)                │   │
//! │  │   New Sale ──► Sales ──► Returns ──► Approvals ──► Reports     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ drumtrack-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌─────────────┐  │   │
//! │  │   │  ledger  │  │  returns  │  │  status  │  │    stats    │  │   │
//! │  │   │ record_  │  │ submit /  │  │ overdue  │  │ dashboards  │  │   │
//! │  │   │   sale   │  │  approve  │  │ resolver │  │  rollups    │  │   │
//! │  │   └──────────┘  └───────────┘  └──────────┘  └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   DrumTracker ── DrumStore port ── Clock ── ChangeSink          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 drumtrack-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, audit log, seeding         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, ReturnRequest, Profile, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input shape checks
//! - [`status`] - Active / returned / overdue resolution
//! - [`stats`] - Pure dashboard aggregations and role scoping
//! - [`ledger`] - Recording multi-line sales
//! - [`returns`] - Return submission and approval
//! - [`receipt`] - Printable receipt data for a sale transaction
//! - [`tracker`] - The [`DrumTracker`] service tying it all together
//! - [`store`], [`clock`], [`events`] - Ports to the outside world
//! - [`memory`] - In-memory store for tests
//!
//! ## Design Principles
//!
//! 1. **Derived, not stored**: "overdue" is computed from `due_date` and `now`
//! 2. **Conditional writes**: state transitions are compare-and-set in the store
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: every failure is a typed [`CoreError`] with a kind
//!
//! ## Example Usage
//!
//! ```rust
//! use drumtrack_core::types::due_date_for;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let sold = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
//! let due = due_date_for(sold);
//! assert_eq!(due - sold, Duration::days(30));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod money;
pub mod receipt;
pub mod returns;
pub mod stats;
pub mod status;
pub mod store;
pub mod tracker;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ReturnPolicy, TrackerConfig};
pub use error::{CoreError, CoreResult, ErrorKind, StoreError, StoreResult, ValidationError};
pub use events::{ChangeAction, ChangeEvent, ChangeSink, EntityKind};
pub use money::Money;
pub use stats::{DashboardStats, DashboardWindow, Scope};
pub use status::SaleState;
pub use store::DrumStore;
pub use tracker::DrumTracker;
pub use types::*;

// =============================================================================
// Constants
// =============================================================================

/// Days a customer has to return drums before the sale is overdue.
pub const RETURN_WINDOW_DAYS: i64 = 30;

/// Maximum category lines accepted in one sale submission.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum drums on a single line.
pub const MAX_LINE_QUANTITY: i64 = 999;
