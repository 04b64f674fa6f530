//! # Money Module
//!
//! Provides the `Money` type for handling monetary values.
//!
//! ## Unrounded Internals, Rounded Presentation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE COMPOUNDING ROUNDING PROBLEM                                       │
//! │                                                                         │
//! │  Rounding at every step of subtotal → discount → tax:                  │
//! │    round(round(round(subtotal) - discount) * 12%)                      │
//! │    Each step can drift by half a centavo, and the drifts add up.       │
//! │                                                                         │
//! │  OUR SOLUTION: keep the whole chain unrounded                           │
//! │    subtotal, discount, tax, total are exact products of the inputs     │
//! │    Only `Display` / `to_cents()` round to 2 decimals (presentation)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use micropos_core::money::Money;
//!
//! let price = Money::new(100.0);
//! let line = price.times_quantity(2);          // 200.00
//! let tax = line.percent(12.0);                // 24.00
//! assert_eq!((line + tax).to_cents(), 22400);
//! assert_eq!(format!("{}", line + tax), "224.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in major currency units (e.g. pesos), unrounded.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogItem.price ──► CartLine (frozen) ──► line total ──► subtotal   │
/// │                                                                         │
/// │  subtotal ──► discount (clamped) ──► tax ──► Transaction.total         │
/// │                                                                         │
/// │  line total × commissionRate ──► commissionTotal ──► Expense.amount    │
/// │                                                                         │
/// │  payment tip ──► TipRecord.total_tip ══ Σ TipShare.amount              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(f64);

impl Money {
    /// Creates a Money value from an amount in major units.
    #[inline]
    pub const fn new(amount: f64) -> Self {
        Money(amount)
    }

    /// Creates a Money value from whole cents (centavos).
    ///
    /// ```rust
    /// use micropos_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).amount(), 10.99);
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(cents as f64 / 100.0)
    }

    /// Returns the raw, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0.0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Checks if the value is strictly greater than zero.
    ///
    /// `NaN` is never positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }

    /// Checks that the amount is a real number (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// Clamps the amount into `[min, max]`.
    ///
    /// Unlike `f64::clamp`, a `NaN` amount collapses to `min` instead of
    /// propagating, so garbage admin input can never leak into a total.
    ///
    /// ```rust
    /// use micropos_core::money::Money;
    ///
    /// let cap = Money::new(100.0);
    /// assert_eq!(Money::new(500.0).clamp(Money::zero(), cap), cap);
    /// assert_eq!(Money::new(-5.0).clamp(Money::zero(), cap), Money::zero());
    /// assert_eq!(Money::new(f64::NAN).clamp(Money::zero(), cap), Money::zero());
    /// ```
    pub fn clamp(self, min: Money, max: Money) -> Money {
        if !(self.0 > min.0) {
            min
        } else if self.0 > max.0 {
            max
        } else {
            self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use micropos_core::money::Money;
    ///
    /// let unit_price = Money::new(2.5);
    /// assert_eq!(unit_price.times_quantity(3), Money::new(7.5));
    /// ```
    #[inline]
    pub fn times_quantity(&self, qty: i64) -> Money {
        Money(self.0 * qty as f64)
    }

    /// Multiplies money by a fractional rate (0.1 = 10%).
    #[inline]
    pub fn times_rate(&self, rate: f64) -> Money {
        Money(self.0 * rate)
    }

    /// Returns `pct` percent of this amount (12.0 = 12%).
    #[inline]
    pub fn percent(&self, pct: f64) -> Money {
        Money(self.0 * pct / 100.0)
    }

    /// Rounds to whole cents for presentation and cent-exact comparison.
    ///
    /// Halves round away from zero (`f64::round`).
    #[inline]
    pub fn to_cents(&self) -> i64 {
        (self.0 * 100.0).round() as i64
    }

    /// Returns the amount rounded to 2 decimals (display only).
    #[inline]
    pub fn rounded(&self) -> Money {
        Money::from_cents(self.to_cents())
    }

    /// True when the amount has no fraction of a cent, ignoring float noise
    /// (`0.1` counts, `149.996` does not).
    pub fn is_whole_cents(&self) -> bool {
        self.0.is_finite() && (self.0 * 100.0 - self.to_cents() as f64).abs() < 1e-6
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays the amount rounded to 2 decimal places, without a currency
/// symbol. Symbols are a configuration concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.times_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl From<f64> for Money {
    fn from(amount: f64) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert!((money.amount() - 10.99).abs() < 1e-9);
        assert_eq!(money.to_cents(), 1099);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::new(10.99)), "10.99");
        assert_eq!(format!("{}", Money::new(5.0)), "5.00");
        assert_eq!(format!("{}", Money::new(-5.5)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
        // Presentation rounding only
        assert_eq!(format!("{}", Money::new(9.6)), "9.60");
        assert_eq!(format!("{}", Money::new(0.004)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(10.0);
        let b = Money::new(5.0);

        assert_eq!(a + b, Money::new(15.0));
        assert_eq!(a - b, Money::new(5.0));
        assert_eq!(a * 3, Money::new(30.0));
    }

    #[test]
    fn test_internal_math_stays_unrounded() {
        // 1/3 of a peso is not representable in cents; it must survive the chain.
        let third = Money::new(1.0 / 3.0);
        let tripled = third * 3;
        assert!((tripled.amount() - 1.0).abs() < 1e-12);
        assert_eq!(third.to_cents(), 33);
    }

    #[test]
    fn test_percent_and_rate() {
        assert_eq!(Money::new(200.0).percent(12.0).to_cents(), 2400);
        assert_eq!(Money::new(100.0).times_rate(0.1).to_cents(), 1000);
    }

    #[test]
    fn test_clamp() {
        let cap = Money::new(100.0);
        assert_eq!(Money::new(20.0).clamp(Money::zero(), cap), Money::new(20.0));
        assert_eq!(Money::new(500.0).clamp(Money::zero(), cap), cap);
        assert_eq!(Money::new(-1.0).clamp(Money::zero(), cap), Money::zero());
        assert_eq!(Money::new(f64::NAN).clamp(Money::zero(), cap), Money::zero());
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::new(90.0), Money::new(60.0)].iter().sum();
        assert_eq!(total, Money::new(150.0));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::new(1.0).is_positive());
        assert!(Money::new(-1.0).is_negative());
        assert!(!Money::new(f64::NAN).is_positive());
        assert!(!Money::new(f64::INFINITY).is_finite());
    }

    #[test]
    fn test_whole_cents() {
        assert!(Money::new(0.1).is_whole_cents());
        assert!(Money::new(149.99).is_whole_cents());
        assert!((Money::new(0.1) + Money::new(0.2)).is_whole_cents());
        assert!(!Money::new(149.996).is_whole_cents());
        assert!(!Money::new(0.005).is_whole_cents());
        assert!(!Money::new(f64::NAN).is_whole_cents());
    }
}
