//! # Repository Module
//!
//! Database repository implementations for drumtrack.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories per table                               │
//! │                                                                         │
//! │  DrumStore impl (store.rs)                                             │
//! │       │                                                                 │
//! │       ├── db.catalog()  ─► drum_categories, shops, profiles            │
//! │       ├── db.sales()    ─► sales            ┐                          │
//! │       ├── db.returns()  ─► return_requests  ├─► audit_logs row in      │
//! │       │                                     ┘   the same transaction   │
//! │       └── db.audit()    ─► audit_logs (read side)                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Reference data
//! - [`SaleRepository`](sale::SaleRepository) - Sale rows
//! - [`ReturnRequestRepository`](return_request::ReturnRequestRepository) - Return requests
//! - [`AuditRepository`](audit::AuditRepository) - Audit trail

pub mod audit;
pub mod catalog;
pub mod return_request;
pub mod sale;
