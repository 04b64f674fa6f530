//! # Commission Calculator
//!
//! Commission is owed on gross line revenue, before discount and tax, and
//! only for lines marked commissionable with a usable rate. It is never
//! subtracted from the sale; it gets booked as a COMMISSIONS expense.

use crate::money::Money;
use crate::types::CartLine;

/// Commission owed on a single line.
///
/// A commissionable item with no rate, a zero rate, or a garbage rate earns
/// nothing.
pub fn line_commission(line: &CartLine) -> Money {
    if !line.item.is_commissionable {
        return Money::zero();
    }

    match line.item.commission_rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => line.line_total().times_rate(rate),
        _ => Money::zero(),
    }
}

/// Total commission owed on the cart.
pub fn commission_total(lines: &[CartLine]) -> Money {
    lines.iter().map(line_commission).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculate_totals;
    use crate::types::{CatalogItem, DiscountSpec, ItemType, TaxRate};

    fn haircut() -> CartLine {
        CartLine::new(
            CatalogItem::new("haircut", ItemType::Service, Money::new(100.0)).with_commission(0.1),
            1,
        )
    }

    #[test]
    fn test_commission_on_gross_revenue() {
        let total = commission_total(&[haircut()]);
        assert!((total.amount() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_commission_ignores_discount_and_tax() {
        let lines = vec![haircut()];
        let before = commission_total(&lines);

        // A discount changes the totals but never the commission
        let totals = calculate_totals(&lines, Some(&DiscountSpec::percent(20.0)), TaxRate::from_percent(12.0));
        assert!((totals.total.amount() - 89.6).abs() < 1e-9);
        assert_eq!(commission_total(&lines), before);
    }

    #[test]
    fn test_non_commissionable_and_missing_rate() {
        let plain = CartLine::new(CatalogItem::new("cola", ItemType::Product, Money::new(50.0)), 4);
        assert!(line_commission(&plain).is_zero());

        let mut no_rate = haircut();
        no_rate.item.commission_rate = None;
        assert!(line_commission(&no_rate).is_zero());

        let mut zero_rate = haircut();
        zero_rate.item.commission_rate = Some(0.0);
        assert!(line_commission(&zero_rate).is_zero());

        let mut not_flagged = haircut();
        not_flagged.item.is_commissionable = false;
        assert!(line_commission(&not_flagged).is_zero());
    }

    #[test]
    fn test_commission_scales_with_quantity() {
        let mut line = haircut();
        line.quantity = 3;
        assert_eq!(commission_total(&[line]).to_cents(), 3000);
    }
}
