//! # Pricing Calculator
//!
//! Turns a cart, an optional discount and a tax rate into order totals.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal           = Σ price × quantity                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_amount    = clamp(raw discount, 0, subtotal)                 │
//! │       │               percent: subtotal × value / 100                  │
//! │       │               fixed:   value                                   │
//! │       ▼                                                                 │
//! │  discounted         = subtotal − discount_amount                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax                = discounted × rate / 100                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total              = discounted + tax          (never negative)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same function serves the live cart preview and the committed
//! transaction, so what the cashier sees is what gets recorded.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CartLine, DiscountSpec, TaxRate};

/// The four figures shown on the order summary and stored on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

/// Gross revenue of the cart, before discount and tax.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Discount actually applied against `subtotal`.
///
/// Clamped to `[0, subtotal]`: a negative or non-finite value yields zero and
/// a discount larger than the order only zeroes it out.
pub fn discount_amount(subtotal: Money, discount: Option<&DiscountSpec>) -> Money {
    match discount {
        Some(spec) => spec.raw_amount(subtotal).clamp(Money::zero(), subtotal),
        None => Money::zero(),
    }
}

/// Computes order totals.
///
/// ```rust
/// use micropos_core::pricing::calculate_totals;
/// use micropos_core::{CartLine, CatalogItem, ItemType, Money, TaxRate};
///
/// let lines = vec![CartLine::new(CatalogItem::new("cola", ItemType::Product, Money::new(50.0)), 2)];
/// let totals = calculate_totals(&lines, None, TaxRate::from_percent(12.0));
///
/// assert_eq!(totals.subtotal.to_cents(), 10000);
/// assert_eq!(totals.tax_amount.to_cents(), 1200);
/// assert_eq!(totals.total.to_cents(), 11200);
/// ```
pub fn calculate_totals(
    lines: &[CartLine],
    discount: Option<&DiscountSpec>,
    tax_rate: TaxRate,
) -> OrderTotals {
    let subtotal = subtotal(lines);
    let discount_amount = discount_amount(subtotal, discount);
    let discounted = subtotal - discount_amount;
    let tax_amount = discounted.percent(tax_rate.percent());

    OrderTotals {
        subtotal,
        discount_amount,
        tax_amount,
        total: discounted + tax_amount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogItem, ItemType};

    fn line(id: &str, price: f64, qty: i64) -> CartLine {
        CartLine::new(CatalogItem::new(id, ItemType::Product, Money::new(price)), qty)
    }

    fn approx(actual: Money, expected: f64) {
        assert!(
            (actual.amount() - expected).abs() < 1e-9,
            "expected {expected}, got {}",
            actual.amount()
        );
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = calculate_totals(&[], Some(&DiscountSpec::fixed(50.0)), TaxRate::from_percent(12.0));
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn test_plain_product_sale() {
        // 2 × 100.00 at 12%
        let totals = calculate_totals(&[line("cola", 100.0, 2)], None, TaxRate::from_percent(12.0));
        approx(totals.subtotal, 200.0);
        approx(totals.discount_amount, 0.0);
        approx(totals.tax_amount, 24.0);
        approx(totals.total, 224.0);
    }

    #[test]
    fn test_percent_discount_taxed_after_discount() {
        // 100.00, 20% off, 12% tax on 80.00
        let totals = calculate_totals(
            &[line("haircut", 100.0, 1)],
            Some(&DiscountSpec::percent(20.0)),
            TaxRate::from_percent(12.0),
        );
        approx(totals.discount_amount, 20.0);
        approx(totals.tax_amount, 9.6);
        approx(totals.total, 89.6);
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let totals = calculate_totals(
            &[line("towel", 100.0, 1)],
            Some(&DiscountSpec::fixed(500.0)),
            TaxRate::from_percent(12.0),
        );
        approx(totals.discount_amount, 100.0);
        approx(totals.tax_amount, 0.0);
        approx(totals.total, 0.0);
    }

    #[test]
    fn test_negative_discount_yields_zero() {
        let lines = [line("gum", 30.0, 1)];
        for spec in [DiscountSpec::fixed(-10.0), DiscountSpec::percent(-5.0)] {
            let totals = calculate_totals(&lines, Some(&spec), TaxRate::zero());
            approx(totals.discount_amount, 0.0);
            approx(totals.total, 30.0);
        }
    }

    #[test]
    fn test_non_finite_inputs_normalize() {
        let lines = [line("gum", 30.0, 1)];
        let totals = calculate_totals(
            &lines,
            Some(&DiscountSpec::fixed(f64::NAN)),
            TaxRate::from_percent(f64::NAN),
        );
        approx(totals.discount_amount, 0.0);
        approx(totals.tax_amount, 0.0);
        approx(totals.total, 30.0);
    }

    #[test]
    fn test_discount_always_within_bounds() {
        let lines = [line("a", 19.99, 3), line("b", 5.25, 2)];
        let subtotal = subtotal(&lines);
        let specs = [
            DiscountSpec::percent(0.0),
            DiscountSpec::percent(33.3),
            DiscountSpec::percent(100.0),
            DiscountSpec::percent(250.0),
            DiscountSpec::fixed(0.01),
            DiscountSpec::fixed(1_000_000.0),
        ];

        for spec in &specs {
            let totals = calculate_totals(&lines, Some(spec), TaxRate::from_percent(12.0));
            assert!(totals.discount_amount.amount() >= 0.0);
            assert!(totals.discount_amount.amount() <= subtotal.amount());
            assert!(totals.total.amount() >= 0.0);
        }
    }

    #[test]
    fn test_unrounded_until_presentation() {
        // 3 × 0.333... must not be rounded per line
        let totals = calculate_totals(&[line("candy", 1.0 / 3.0, 3)], None, TaxRate::zero());
        approx(totals.total, 1.0);
        assert_eq!(totals.total.to_string(), "1.00");
    }
}
