//! # tillpoint-core: Pure Domain Logic for Tillpoint
//!
//! Everything here is deterministic and free of I/O. The database crate and
//! the service layer build on these types; nothing in this crate knows that
//! SQLite or JWTs exist.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tillpoint Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/backend (service layer)                    │   │
//! │  │    resolve scope ──► process sale ──► build report              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tillpoint-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │    ids    │  │  tenant   │  │   sale    │  │  report   │  │   │
//! │  │   │  IdCodec  │  │TenantScope│  │ SaleTally │  │ aggregate │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   types   │  │validation │  │object_key │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tillpoint-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - Reversible public identifiers (`IdCodec`)
//! - [`tenant`] - `TenantId` and the request-scoped `TenantScope`
//! - [`money`] - Exact decimal `Money` and `DiscountPercent`
//! - [`types`] - Entities, typed patches, pagination
//! - [`sale`] - Server-side sale total computation and verification
//! - [`report`] - Sales report windowing and aggregation
//! - [`object_key`] - Tenant-namespaced object storage keys
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod money;
pub mod object_key;
pub mod report;
pub mod sale;
pub mod tenant;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ids::{IdCodec, IdCodecConfig};
pub use money::{DiscountPercent, Money};
pub use tenant::{TenantId, TenantScope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single sale request.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single sale line.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest single stock adjustment, in either direction.
pub const MAX_STOCK_ADJUSTMENT: i64 = 1_000_000_000;

/// Largest accepted price (10^15). Keeps every sale and report sum far from
/// the decimal range limit.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Page size of `PageRequest::default()`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for any paginated listing.
pub const MAX_PAGE_SIZE: u32 = 100;
