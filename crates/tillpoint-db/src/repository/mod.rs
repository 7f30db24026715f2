//! # Repository Module
//!
//! Database repository implementations for Tillpoint.
//!
//! ## Scoping Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Table               Access                                             │
//! │  ─────────────────   ─────────────────────────────────────────────────  │
//! │  products            &TenantScope on every call; WHERE tenant_id = ?    │
//! │  transactions        &TenantScope on every call; WHERE tenant_id = ?    │
//! │  transaction_items   only through their parent transaction             │
//! │  tenants             platform-admin paths (guarded in the service)      │
//! │  users               platform-admin paths and login lookup              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions that must join a caller's atomic unit take
//! `&mut SqliteConnection` (a `Transaction` derefs to one) instead of
//! using the repository's pool.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and stock adjustment
//! - [`SaleRepository`](sale::SaleRepository) - Sale headers and lines
//! - [`TenantRepository`](tenant::TenantRepository) - Tenant records
//! - [`UserRepository`](user::UserRepository) - Login accounts
//! - [`ReportRepository`](report::ReportRepository) - Sale lines inside a window

pub mod product;
pub mod report;
pub mod sale;
pub mod tenant;
pub mod user;

use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a decimal TEXT column into a domain value.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> DbResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| DbError::Internal(format!("invalid {column} '{raw}': {e}")))
}

/// Current time truncated to whole microseconds, as stored.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}
