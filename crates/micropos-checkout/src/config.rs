//! # Checkout Configuration
//!
//! Store-level settings the checkout pipeline runs with.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`MICROPOS_*`)
//! 2. Defaults (this file)
//!
//! Read-only after startup.

use serde::{Deserialize, Serialize};

use micropos_core::{Money, TaxRate, DEFAULT_TAX_RATE_PERCENT, SYSTEM_RECORDER};

/// Default retry budget for transaction id collisions.
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    /// Store this register sells for.
    pub store_id: String,

    /// Store name (displayed on receipts)
    pub store_name: String,

    /// Tax rate a newly set up store starts with.
    pub default_tax_rate: TaxRate,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Signed-in cashier, if any. Auto-posted expenses fall back to
    /// [`SYSTEM_RECORDER`] without one.
    pub cashier_id: Option<String>,

    /// How many fresh transaction ids to try before giving up.
    pub max_id_attempts: u32,
}

impl Default for CheckoutConfig {
    /// Development defaults: a single store, 12% tax, pesos.
    fn default() -> Self {
        CheckoutConfig {
            store_id: "store-1".to_string(),
            store_name: "MicroPOS Dev Store".to_string(),
            default_tax_rate: TaxRate::from_percent(DEFAULT_TAX_RATE_PERCENT),
            currency_symbol: "₱".to_string(),
            cashier_id: None,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl CheckoutConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `MICROPOS_STORE_ID`: Store id
    /// - `MICROPOS_STORE_NAME`: Store name
    /// - `MICROPOS_TAX_RATE`: Default tax rate percentage (e.g., "12")
    /// - `MICROPOS_CURRENCY_SYMBOL`: Currency symbol
    /// - `MICROPOS_CASHIER_ID`: Signed-in cashier
    /// - `MICROPOS_MAX_ID_ATTEMPTS`: Transaction id retry budget
    ///
    /// Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CheckoutConfig::default();

        if let Some(store_id) = lookup("MICROPOS_STORE_ID") {
            config.store_id = store_id;
        }

        if let Some(store_name) = lookup("MICROPOS_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(rate) = lookup("MICROPOS_TAX_RATE").and_then(|s| s.trim().parse::<f64>().ok()) {
            config.default_tax_rate = TaxRate::from_percent(rate);
        }

        if let Some(symbol) = lookup("MICROPOS_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(cashier_id) = lookup("MICROPOS_CASHIER_ID").filter(|s| !s.trim().is_empty()) {
            config.cashier_id = Some(cashier_id);
        }

        if let Some(attempts) = lookup("MICROPOS_MAX_ID_ATTEMPTS").and_then(|s| s.trim().parse::<u32>().ok()) {
            config.max_id_attempts = attempts.max(1);
        }

        config
    }

    /// Who auto-posted expenses are recorded as.
    pub fn recorder(&self) -> &str {
        self.cashier_id.as_deref().unwrap_or(SYSTEM_RECORDER)
    }

    /// Formats an amount for display, rounded to 2 decimals.
    ///
    /// ```rust
    /// use micropos_checkout::CheckoutConfig;
    /// use micropos_core::Money;
    ///
    /// let config = CheckoutConfig::default();
    /// assert_eq!(config.format_currency(Money::new(89.6)), "₱89.60");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.to_cents();
        let abs = cents.abs();

        format!(
            "{}{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            abs / 100,
            abs % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_currency() {
        let config = CheckoutConfig::default();
        assert_eq!(config.format_currency(Money::new(12.34)), "₱12.34");
        assert_eq!(config.format_currency(Money::new(1.0)), "₱1.00");
        assert_eq!(config.format_currency(Money::zero()), "₱0.00");
        assert_eq!(config.format_currency(Money::new(-12.34)), "-₱12.34");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MICROPOS_STORE_ID", "salon-7"),
            ("MICROPOS_TAX_RATE", "8.5"),
            ("MICROPOS_CURRENCY_SYMBOL", "$"),
            ("MICROPOS_CASHIER_ID", "cashier-2"),
            ("MICROPOS_MAX_ID_ATTEMPTS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = CheckoutConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.store_id, "salon-7");
        assert_eq!(config.default_tax_rate.percent(), 8.5);
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.recorder(), "cashier-2");
        assert_eq!(config.max_id_attempts, DEFAULT_MAX_ID_ATTEMPTS);
    }

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::from_lookup(|_| None);
        assert_eq!(config.default_tax_rate.percent(), 12.0);
        assert_eq!(config.recorder(), SYSTEM_RECORDER);
    }
}
