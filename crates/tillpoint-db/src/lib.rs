//! # tillpoint-db: Database Layer for Tillpoint
//!
//! SQLite persistence for tenants, users, products and sales. Every query
//! against a tenant-owned table takes a [`TenantScope`](tillpoint_core::TenantScope)
//! and filters on it; there is no unscoped accessor for those tables.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tillpoint Data Flow                              │
//! │                                                                         │
//! │  SaleService::create_sale(scope, request)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tillpoint-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo       │    │ 001_initial  │  │   │
//! │  │   │ begin()       │    │ TenantRepo     │    │   _schema    │  │   │
//! │  │   │               │    │ UserRepo       │    │              │  │   │
//! │  │   │               │    │ ReportRepo     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tillpoint_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tillpoint.db")).await?;
//! let page = db.products().list(&scope, PageRequest::new(1, 20)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::{NewSale, NewSaleLine, SaleRepository};
pub use repository::tenant::TenantRepository;
pub use repository::user::UserRepository;
