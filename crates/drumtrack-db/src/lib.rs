//! # drumtrack-db: Database Layer for drumtrack
//!
//! SQLite storage for drum sales and return requests. [`Database`]
//! implements the core's [`DrumStore`](drumtrack_core::DrumStore) port.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        drumtrack Data Flow                              │
//! │                                                                         │
//! │  DrumTracker (drumtrack-core)                                          │
//! │       │  DrumStore trait                                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  drumtrack-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial_ │  │   │
//! │  │   │ DbConfig      │    │ ReturnRepo    │    │   schema.sql │  │   │
//! │  │   │               │    │ AuditRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DRUMTRACK_DB_PATH)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and the mapping to `StoreError`
//! - [`repository`] - One repository per table group
//! - [`store`] - The `DrumStore` implementation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drumtrack_core::{DrumTracker, TrackerConfig};
//! use drumtrack_db::{Database, DbConfig};
//!
//! let db = Arc::new(Database::new(DbConfig::from_env()?).await?);
//! let tracker = DrumTracker::new(db).with_config(TrackerConfig::from_env()?);
//!
//! let pending = tracker.pending_approvals().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::{AuditEntry, AuditRepository};
pub use repository::catalog::CatalogRepository;
pub use repository::return_request::ReturnRequestRepository;
pub use repository::sale::SaleRepository;
