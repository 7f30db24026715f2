//! # Error Types
//!
//! Domain-specific error types for tillpoint-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillpoint-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillpoint-db errors                                                   │
//! │  └── DbError          - Store failures (+ CoreError raised in a unit)  │
//! │                                                                         │
//! │  backend errors                                                        │
//! │  └── ApiError         - What callers see (code + safe message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids carried by these errors are raw row ids. The service layer re-encodes
//! them before anything leaves the process.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A sale request arrived with no lines.
    #[error("Sale must contain at least one item")]
    EmptySale,

    /// Product is absent or owned by another tenant.
    ///
    /// ## When This Occurs
    /// - The id was never issued
    /// - The id belongs to a different tenant (indistinguishable on purpose)
    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    /// Sale is absent or owned by another tenant.
    #[error("Sale not found: {id}")]
    SaleNotFound { id: i64 },

    /// Tenant does not exist.
    #[error("Tenant not found: {id}")]
    TenantNotFound { id: i64 },

    /// Selling more than is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// createSale(qty: 5)
    ///      │
    ///      ▼
    /// guarded decrement: stock 3 - 5 < 0 → no row updated
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Nasi Goreng", requested: 5, available: 3 }
    /// ```
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    /// The caller's total disagrees with the server-computed one.
    #[error("Total mismatch: claimed {claimed}, computed {computed}")]
    TotalMismatch { claimed: Money, computed: Money },

    /// SKU already used by another product of the same tenant.
    #[error("SKU '{sku}' already exists")]
    DuplicateSku { sku: String },

    /// A tenant-bound operation was attempted without a tenant.
    #[error("Request is not bound to a tenant")]
    MissingTenantScope,

    /// A public identifier could not be decoded.
    #[error("Invalid identifier: '{token}'")]
    InvalidTokenFormat { token: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_token(token: impl Into<String>) -> Self {
        CoreError::InvalidTokenFormat {
            token: token.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation begins, so they never need a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Lower bound of a range lies after its upper bound.
    #[error("{start} must not be after {end}")]
    InvertedRange { start: String, end: String },

    /// Arithmetic on the value left the representable decimal range.
    #[error("{field} exceeds the supported amount range")]
    Overflow { field: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn overflow(field: &str) -> Self {
        ValidationError::Overflow {
            field: field.to_string(),
        }
    }

    pub fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Nasi Ayam".to_string(),
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Nasi Ayam: requested 5, available 3"
        );
    }

    #[test]
    fn test_total_mismatch_message() {
        let err = CoreError::TotalMismatch {
            claimed: Money::new(dec!(599999)),
            computed: Money::new(dec!(600000)),
        };
        assert_eq!(
            err.to_string(),
            "Total mismatch: claimed 599999.00, computed 600000.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("sku").to_string(), "sku is required");

        let err = ValidationError::InvertedRange {
            start: "start_date".to_string(),
            end: "end_date".to_string(),
        };
        assert_eq!(err.to_string(), "start_date must not be after end_date");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("cashier").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
