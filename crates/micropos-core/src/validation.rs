//! # Validation Module
//!
//! Input validation utilities for MicroPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Cart / Tip entry (micropos-core)                             │
//! │  ├── Quantity limits, stock sufficiency                                │
//! │  └── Tip allocation sums                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Catalog writes (THIS MODULE)                                 │
//! │  ├── Names, SKUs, prices, commission rates                             │
//! │  └── Bundle / consumed references                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use micropos_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("COKE-330").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CatalogItem, ComponentRef, ItemType};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

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
/// use micropos_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
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
        return Err(ValidationError::invalid(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates an item name: required, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Cashier taps item, quantity: 5                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → stock check, then into the cart                         │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: MAX_ITEM_QUANTITY as f64,
        });
    }

    Ok(())
}

/// Validates a price or cost. Zero is allowed (free items, internal
/// consumables).
pub fn validate_price(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_finite() || amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a commission rate, a fraction between 0 and 1.
pub fn validate_commission_rate(rate: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "commission_rate".to_string(),
            min: 0.0,
            max: 1.0,
        });
    }

    Ok(())
}

/// Validates a tax rate percentage (0 to 100).
pub fn validate_tax_rate_percent(pct: f64) -> ValidationResult<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Item Validator
// =============================================================================

/// Validates a catalog entry before it is written.
///
/// ## Rules
/// - id, name and SKU as above
/// - price and cost not negative
/// - commission rate within [0, 1] when set
/// - component references name an item other than the parent
/// - only menus carry bundle items
pub fn validate_catalog_item(item: &CatalogItem) -> ValidationResult<()> {
    if item.id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }
    validate_item_name(&item.name)?;
    validate_sku(&item.sku)?;
    validate_price("price", item.price)?;
    validate_price("cost", item.cost)?;

    if let Some(rate) = item.commission_rate {
        validate_commission_rate(rate)?;
    }

    if !item.bundle_items.is_empty() && item.item_type != ItemType::Menu {
        return Err(ValidationError::invalid(
            "bundle_items",
            "only menu items can have bundle items",
        ));
    }

    validate_components("bundle_items", &item.id, &item.bundle_items)?;
    validate_components("consumed_items", &item.id, &item.consumed_items)?;

    Ok(())
}

fn validate_components(field: &str, parent_id: &str, components: &[ComponentRef]) -> ValidationResult<()> {
    for child in components {
        if child.item_id.trim().is_empty() {
            return Err(ValidationError::required(field));
        }
        if child.item_id == parent_id {
            return Err(ValidationError::invalid(field, "an item cannot contain itself"));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stock;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Chicken Combo").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_commission_rate(0.35).is_ok());
        assert!(validate_commission_rate(1.5).is_err());
        assert!(validate_commission_rate(f64::NAN).is_err());

        assert!(validate_tax_rate_percent(12.0).is_ok());
        assert!(validate_tax_rate_percent(-1.0).is_err());
    }

    #[test]
    fn test_validate_catalog_item() {
        let item = CatalogItem::new("combo", ItemType::Menu, Money::new(199.0))
            .with_stock(Stock::Untracked)
            .with_bundle(vec![ComponentRef::new("burger", 1)]);
        assert!(validate_catalog_item(&item).is_ok());

        let self_ref = item.clone().with_bundle(vec![ComponentRef::new("combo", 1)]);
        assert!(validate_catalog_item(&self_ref).is_err());

        let mut not_menu = item.clone();
        not_menu.item_type = ItemType::Product;
        assert!(validate_catalog_item(&not_menu).is_err());

        let negative = item.with_cost(Money::new(-1.0));
        assert!(validate_catalog_item(&negative).is_err());
    }
}
