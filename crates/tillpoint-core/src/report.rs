//! # Sales Report Aggregation
//!
//! Turns the committed sale lines of one tenant inside a date window into
//! revenue, units and per-product figures.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "2024-01-01", "2024-01-31"                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReportWindow::from_dates ── start > end? ──► ValidationError           │
//! │       │   start = 2024-01-01T00:00:00Z                                  │
//! │       │   end   = 2024-01-31T23:59:59.999999999Z                        │
//! │       ▼                                                                 │
//! │  tillpoint-db: lines in window for the tenant                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  aggregate(lines) ──► SalesReport                                       │
//! │       • group by product: Σ quantity, Σ unit_price × quantity           │
//! │       • order by revenue desc, then product id asc                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue is gross line revenue (before the sale-level discount), which is
//! what existing report consumers expect.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::parse_calendar_date;

// =============================================================================
// Window
// =============================================================================

/// Inclusive time window covering whole calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    /// Builds the window `[start 00:00, end 23:59:59.999999999]`.
    ///
    /// ## Errors
    /// `InvertedRange` when `start` is after `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: "start_date".to_string(),
                end: "end_date".to_string(),
            });
        }

        let start_of_day = start.and_time(NaiveTime::MIN).and_utc();
        let end_of_day = end
            .and_time(NaiveTime::MIN)
            .and_utc()
            + TimeDelta::days(1)
            - TimeDelta::nanoseconds(1);

        Ok(ReportWindow {
            start: start_of_day,
            end: end_of_day,
        })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = parse_calendar_date("start_date", start)?;
        let end = parse_calendar_date("end_date", end)?;
        ReportWindow::from_dates(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// =============================================================================
// Input / Output
// =============================================================================

/// One committed sale line inside the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub sale_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Per-product figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// The report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_revenue: Money,
    pub items_sold: i64,

    /// Revenue ÷ number of product groups. Kept for compatibility with
    /// existing consumers; see `average_per_transaction` for the
    /// per-sale figure.
    pub average_transaction_value: Money,

    /// Distinct sales in the window.
    pub transaction_count: i64,

    /// Revenue ÷ distinct sales.
    pub average_per_transaction: Money,

    /// Ordered by revenue descending, ties by product id ascending.
    pub breakdown: Vec<ProductSales>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates window lines into a report.
///
/// ## Errors
/// `Overflow` when a revenue or quantity sum leaves its numeric range.
///
/// ## Example
/// ```rust
/// use tillpoint_core::money::Money;
/// use tillpoint_core::report::{aggregate, ReportLine};
///
/// let report = aggregate(vec![ReportLine {
///     sale_id: 1,
///     product_id: 7,
///     product_name: "Nasi Ayam".into(),
///     quantity: 50,
///     unit_price: Money::from_major(12000),
/// }])
/// .unwrap();
/// assert_eq!(report.total_revenue, Money::from_major(600000));
/// assert_eq!(report.items_sold, 50);
/// ```
pub fn aggregate(
    lines: impl IntoIterator<Item = ReportLine>,
) -> Result<SalesReport, ValidationError> {
    let mut groups: BTreeMap<i64, ProductSales> = BTreeMap::new();
    let mut sales: BTreeSet<i64> = BTreeSet::new();

    for line in lines {
        sales.insert(line.sale_id);
        let revenue = line
            .unit_price
            .multiply_quantity(line.quantity)
            .ok_or_else(|| ValidationError::overflow("revenue"))?;
        let group = groups.entry(line.product_id).or_insert_with(|| ProductSales {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: 0,
            revenue: Money::zero(),
        });
        group.quantity = group
            .quantity
            .checked_add(line.quantity)
            .ok_or_else(|| ValidationError::overflow("items sold"))?;
        group.revenue = group
            .revenue
            .checked_add(revenue)
            .ok_or_else(|| ValidationError::overflow("revenue"))?;
    }

    // BTreeMap yields ascending product ids; the stable sort keeps that
    // order among equal revenues.
    let mut breakdown: Vec<ProductSales> = groups.into_values().collect();
    breakdown.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    let mut total_revenue = Money::zero();
    let mut items_sold: i64 = 0;
    for group in &breakdown {
        total_revenue = total_revenue
            .checked_add(group.revenue)
            .ok_or_else(|| ValidationError::overflow("total revenue"))?;
        items_sold = items_sold
            .checked_add(group.quantity)
            .ok_or_else(|| ValidationError::overflow("items sold"))?;
    }
    let transaction_count = sales.len();

    Ok(SalesReport {
        total_revenue,
        items_sold,
        average_transaction_value: total_revenue.average_over(breakdown.len()),
        transaction_count: transaction_count as i64,
        average_per_transaction: total_revenue.average_over(transaction_count),
        breakdown,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn line(sale_id: i64, product_id: i64, name: &str, quantity: i64, price: i64) -> ReportLine {
        ReportLine {
            sale_id,
            product_id,
            product_name: name.to_string(),
            quantity,
            unit_price: Money::from_major(price),
        }
    }

    #[test]
    fn test_window_normalizes_end_of_day() {
        let window = ReportWindow::parse("2024-01-01", "2024-01-31").unwrap();

        assert_eq!(window.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_single_day_window() {
        let window = ReportWindow::parse("2024-03-05", "2024-03-05").unwrap();
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        assert!(matches!(
            ReportWindow::parse("2024-02-01", "2024-01-31"),
            Err(ValidationError::InvertedRange { .. })
        ));
        assert!(ReportWindow::parse("2024-13-01", "2024-01-31").is_err());
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate(Vec::new()).unwrap();
        assert_eq!(report.total_revenue, Money::zero());
        assert_eq!(report.items_sold, 0);
        assert_eq!(report.average_transaction_value, Money::zero());
        assert_eq!(report.average_per_transaction, Money::zero());
        assert!(report.breakdown.is_empty());
    }

    #[test]
    fn test_groups_and_orders_by_revenue() {
        let report = aggregate(vec![
            line(1, 10, "Es Teh", 4, 5000),
            line(1, 20, "Nasi Ayam", 2, 12000),
            line(2, 10, "Es Teh", 1, 5000),
            line(2, 30, "Kerupuk", 5, 1000),
        ])
        .unwrap();

        let order: Vec<i64> = report.breakdown.iter().map(|g| g.product_id).collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(report.breakdown[0].quantity, 5);
        assert_eq!(report.breakdown[0].revenue, Money::from_major(25000));
        assert_eq!(report.total_revenue, Money::from_major(54000));
        assert_eq!(report.items_sold, 12);
        assert_eq!(report.transaction_count, 2);
        // 54000 / 3 product groups
        assert_eq!(report.average_transaction_value, Money::from_major(18000));
        // 54000 / 2 sales
        assert_eq!(report.average_per_transaction, Money::from_major(27000));
    }

    #[test]
    fn test_revenue_ties_break_by_product_id() {
        let report = aggregate(vec![
            line(1, 9, "B", 1, 100),
            line(1, 3, "A", 1, 100),
            line(1, 5, "C", 2, 50),
        ])
        .unwrap();
        let order: Vec<i64> = report.breakdown.iter().map(|g| g.product_id).collect();
        assert_eq!(order, vec![3, 5, 9]);
    }

    #[test]
    fn test_uses_snapshotted_unit_prices() {
        // Same product sold at two different historical prices.
        let report = aggregate(vec![
            ReportLine {
                unit_price: Money::new(dec!(10.50)),
                ..line(1, 1, "Kopi", 2, 0)
            },
            ReportLine {
                unit_price: Money::new(dec!(12.00)),
                ..line(2, 1, "Kopi", 1, 0)
            },
        ])
        .unwrap();
        assert_eq!(report.total_revenue, Money::new(dec!(33.00)));
        assert_eq!(report.breakdown.len(), 1);
    }

    #[test]
    fn test_overflowing_revenue_is_an_error() {
        let huge = ReportLine {
            unit_price: Money::new(rust_decimal::Decimal::MAX),
            ..line(1, 1, "Emas", 1, 0)
        };
        let err = aggregate(vec![huge.clone(), ReportLine { sale_id: 2, ..huge }]).unwrap_err();
        assert_eq!(err, ValidationError::overflow("revenue"));
    }
}
