//! # Money Module
//!
//! Exact decimal currency amounts and discount percentages.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE TOTAL-VERIFICATION PROBLEM                                         │
//! │                                                                         │
//! │  The cashier terminal sends a claimed total. The server recomputes it  │
//! │  and compares with STRICT equality, no tolerance:                      │
//! │                                                                         │
//! │    f64:     12000 × 3 × 0.9 = 32399.999999999996   ❌ mismatch         │
//! │    Decimal: 12000 × 3 × 90 / 100 = 32400           ✅ exact            │
//! │                                                                         │
//! │  Prices arrive as decimal strings/numbers and stay decimal end to end. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tillpoint_core::money::{DiscountPercent, Money};
//!
//! let unit = Money::new(Decimal::from(12000));
//! let line = unit.multiply_quantity(3).unwrap();
//! let total = line.apply_discount(DiscountPercent::new(Decimal::from(10)).unwrap());
//! assert_eq!(total, Some(Money::new(Decimal::from(32400))));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A currency amount.
///
/// Equality is numeric: `600000` and `600000.00` are the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Whole currency units, e.g. `Money::from_major(12000)`.
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a line quantity. `None` when the product leaves the
    /// decimal range.
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// let line = Money::from_major(12000).multiply_quantity(50);
    /// assert_eq!(line, Some(Money::from_major(600000)));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Adds two amounts. `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Applies a percentage discount: `amount × (100 − d) / 100`.
    ///
    /// No rounding happens here. The result is the exact value the claimed
    /// total is compared against. `None` on overflow.
    pub fn apply_discount(&self, discount: DiscountPercent) -> Option<Money> {
        let remaining = Decimal::ONE_HUNDRED - discount.value();
        self.0
            .checked_mul(remaining)?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(Money)
    }

    /// Divides evenly, rounding to cents (midpoint away from zero).
    ///
    /// Returns zero for a zero divisor.
    pub fn average_over(&self, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(self.0 / Decimal::from(count as u64)).round_to_cents()
    }

    /// Rounds to two decimal places, midpoint away from zero.
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Canonical text for storage (scale preserved, no exponent).
    pub fn to_storage_string(&self) -> String {
        self.0.to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two decimal places, no currency symbol (single-currency system).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|e| ValidationError::invalid_format("amount", e.to_string()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Sale-level discount as a percentage in `0..=100`.
///
/// Validated on construction and on deserialization, so a `DiscountPercent`
/// in hand is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(DiscountPercent(value))
    }

    #[inline]
    pub const fn none() -> Self {
        DiscountPercent(Decimal::ZERO)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for DiscountPercent {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        DiscountPercent::new(value)
    }
}

impl From<DiscountPercent> for Decimal {
    fn from(discount: DiscountPercent) -> Self {
        discount.0
    }
}

impl FromStr for DiscountPercent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| ValidationError::invalid_format("discount", e.to_string()))?;
        DiscountPercent::new(value)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
