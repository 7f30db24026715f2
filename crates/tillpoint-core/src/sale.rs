//! # Sale Tally
//!
//! Pure half of sale processing: accumulate snapshotted line prices, apply
//! the discount, and verify the caller's claimed total.
//!
//! ```text
//! for each line:   running += unit_price × quantity
//! then:            total    = running × (100 − discount) / 100
//! finally:         claimed == total  (exact)  else TotalMismatch
//! ```
//!
//! The stock side (guarded decrements inside the transaction) lives in the
//! database layer; this type only sees prices that were read inside that
//! same transaction.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountPercent, Money};

/// Running totals for one sale being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleTally {
    subtotal: Money,
    units: i64,
    lines: usize,
}

impl SaleTally {
    pub fn new() -> Self {
        SaleTally::default()
    }

    /// Adds a line and returns its total.
    ///
    /// ## Errors
    /// `Overflow` when the line or the running subtotal leaves the decimal
    /// range. The tally is left unchanged.
    pub fn add_line(&mut self, unit_price: Money, quantity: i64) -> Result<Money, ValidationError> {
        let line_total = unit_price
            .multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::overflow("line total"))?;
        let subtotal = self
            .subtotal
            .checked_add(line_total)
            .ok_or_else(|| ValidationError::overflow("sale total"))?;
        let units = self
            .units
            .checked_add(quantity)
            .ok_or_else(|| ValidationError::overflow("quantity"))?;

        self.subtotal = subtotal;
        self.units = units;
        self.lines += 1;
        Ok(line_total)
    }

    /// Sum of line totals before discount.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Total after discount.
    pub fn total(&self, discount: DiscountPercent) -> Result<Money, ValidationError> {
        self.subtotal
            .apply_discount(discount)
            .ok_or_else(|| ValidationError::overflow("sale total"))
    }

    /// Computes the final total and checks it against the caller's claim.
    ///
    /// ## Returns
    /// The server-computed total. This, never `claimed`, is what gets stored.
    ///
    /// ## Errors
    /// * `TotalMismatch` on any difference, however small
    /// * `Validation(Overflow)` when the discounted total is not representable
    pub fn verify(&self, discount: DiscountPercent, claimed: Money) -> CoreResult<Money> {
        let computed = self.total(discount)?;
        if computed != claimed {
            return Err(CoreError::TotalMismatch { claimed, computed });
        }
        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_line_no_discount() {
        let mut tally = SaleTally::new();
        let line = tally.add_line(Money::from_major(12000), 50).unwrap();

        assert_eq!(line, Money::from_major(600000));
        assert_eq!(tally.units(), 50);
        assert_eq!(
            tally.verify(DiscountPercent::none(), Money::from_major(600000)),
            Ok(Money::from_major(600000))
        );
    }

    #[test]
    fn test_claim_with_different_scale_is_equal() {
        let mut tally = SaleTally::new();
        tally.add_line(Money::new(dec!(2.50)), 4).unwrap();
        assert!(tally
            .verify(DiscountPercent::none(), Money::new(dec!(10)))
            .is_ok());
    }

    #[test]
    fn test_discount_applied_after_all_lines() {
        let mut tally = SaleTally::new();
        tally.add_line(Money::from_major(12000), 2).unwrap();
        tally.add_line(Money::from_major(5000), 1).unwrap();

        let discount = DiscountPercent::new(dec!(10)).unwrap();
        assert_eq!(tally.subtotal(), Money::from_major(29000));
        assert_eq!(tally.verify(discount, Money::from_major(26100)), Ok(Money::from_major(26100)));
        assert_eq!(tally.lines(), 2);
    }

    #[test]
    fn test_any_difference_is_a_mismatch() {
        let mut tally = SaleTally::new();
        tally.add_line(Money::from_major(12000), 50).unwrap();

        let err = tally
            .verify(DiscountPercent::none(), Money::new(dec!(599999.99)))
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::TotalMismatch {
                claimed: Money::new(dec!(599999.99)),
                computed: Money::from_major(600000),
            }
        );
    }

    #[test]
    fn test_overflowing_line_is_rejected() {
        let mut tally = SaleTally::new();
        tally.add_line(Money::from_major(100), 2).unwrap();

        let huge = Money::new(dec!(10000000000000000000000000));
        let err = tally.add_line(huge, 9_999).unwrap_err();
        assert_eq!(err, ValidationError::overflow("line total"));

        // The earlier line is still the whole tally.
        assert_eq!(tally.subtotal(), Money::from_major(200));
        assert_eq!(tally.units(), 2);
        assert_eq!(tally.lines(), 1);
    }

    #[test]
    fn test_overflowing_subtotal_is_rejected() {
        let mut tally = SaleTally::new();
        tally.add_line(Money::new(Decimal::MAX), 1).unwrap();

        let err = tally.add_line(Money::from_major(1), 1).unwrap_err();
        assert_eq!(err, ValidationError::overflow("sale total"));
        assert!(matches!(
            tally.verify(DiscountPercent::new(dec!(10)).unwrap(), Money::zero()),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_lines_after_discount(
            lines in prop::collection::vec((1i64..1_000_000, 1i64..100), 1..20),
            discount in 0u32..=100,
        ) {
            let discount = DiscountPercent::new(Decimal::from(discount)).unwrap();
            let mut tally = SaleTally::new();
            let mut expected = Decimal::ZERO;
            for (price, qty) in &lines {
                tally.add_line(Money::from_major(*price), *qty).unwrap();
                expected += Decimal::from(*price) * Decimal::from(*qty);
            }
            let expected = expected * (Decimal::ONE_HUNDRED - discount.value()) / Decimal::ONE_HUNDRED;

            prop_assert_eq!(tally.total(discount), Ok(Money::new(expected)));
            prop_assert!(tally.verify(discount, Money::new(expected)).is_ok());
            let off = Money::new(expected + Decimal::new(1, 2));
            prop_assert!(tally.verify(discount, off).is_err());
        }
    }
}
