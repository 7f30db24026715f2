//! # Validation Module
//!
//! Input validation for Tillpoint.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Wire decoding (serde)                                        │
//! │  ├── Types, DiscountPercent range                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Runs BEFORE any transaction opens                                 │
//! │  └── So a validation failure never needs a rollback                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity >= 1)                         │
//! │  └── UNIQUE (tenant_id, sku)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_ITEM_QUANTITY, MAX_SALE_LINES, MAX_STOCK_ADJUSTMENT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Calendar date format accepted by report queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use tillpoint_core::validation::validate_sku;
///
/// assert!(validate_sku("NAS001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a product name (1–200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_label("name", name, 200)
}

/// Validates a required free-text label such as cashier or payment method.
pub fn validate_label(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates optional free text (notes, profile fields).
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a login name: 3–50 characters, letters, digits, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }
    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::invalid_format(
            "username",
            "must contain only letters, digits, '.', '_' or '-'",
        ));
    }

    Ok(())
}

/// Validates a new password (at least 6 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a relative stock change: non-zero, magnitude at most
/// [`MAX_STOCK_ADJUSTMENT`].
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 || delta.unsigned_abs() > MAX_STOCK_ADJUSTMENT as u64 {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK_ADJUSTMENT,
            max: MAX_STOCK_ADJUSTMENT,
        });
    }
    Ok(())
}

/// Validates a stock level (≥ 0).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a price: non-negative and at most [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount > Money::from_major(MAX_AMOUNT) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Validates a sale price (> 0, at most [`MAX_AMOUNT`]).
pub fn validate_sale_price(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "sale_price".to_string(),
        });
    }
    validate_amount("sale_price", amount)
}

/// Validates a caller-supplied total. Only the sign is checked here; the
/// size is bounded by the prices it is compared against.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale request (1..=MAX_SALE_LINES).
///
/// An empty request is reported separately as `EmptySale`.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` calendar date.
///
/// ## Example
/// ```rust
/// use tillpoint_core::validation::parse_calendar_date;
///
/// assert!(parse_calendar_date("start_date", "2024-01-31").is_ok());
/// assert!(parse_calendar_date("start_date", "31/01/2024").is_err());
/// ```
pub fn parse_calendar_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD"))
}

// =============================================================================
// Unit Tests
// =============================================================================
