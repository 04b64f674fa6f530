//! # Cart
//!
//! The order being built at the register.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Method                  Cart Change           │
//! │  ──────────────           ──────                  ───────────           │
//! │                                                                         │
//! │  Tap item ───────────────► add_item() ──────────► push / qty += n      │
//! │                             (stock checked)                             │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► qty = n (≤0 removes) │
//! │                                                                         │
//! │  Remove ─────────────────► remove_item() ───────► lines.remove(i)      │
//! │                                                                         │
//! │  Sale committed ─────────► clear() ─────────────► lines.clear()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by item id (adding the same item increases quantity)
//! - Quantity is always in `1..=MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines
//! - Tracked items never exceed the stock seen when they were added

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, CatalogItem, Stock};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds `quantity` of a catalog item, or increases the existing line.
    ///
    /// The item is snapshotted on first add. Stock sufficiency is checked
    /// against `item`, the freshest copy the caller has.
    pub fn add_item(&mut self, item: &CatalogItem, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if !item.enabled {
            return Err(CoreError::ItemNotFound(item.id.clone()));
        }

        let in_cart = self.quantity_of(&item.id);
        let requested = in_cart + quantity;

        if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }

        check_stock(item, requested)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.quantity = requested;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::new(item.clone(), quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(item_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item.id == item_id)
            .ok_or_else(|| CoreError::NotInCart(item_id.to_string()))?;

        check_stock(&line.item, quantity)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item.id != item_id);

        if self.lines.len() == initial_len {
            Err(CoreError::NotInCart(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Quantity of `item_id` already in the cart.
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.item.id == item_id)
            .map_or(0, |l| l.quantity)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        crate::pricing::subtotal(&self.lines)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

fn check_stock(item: &CatalogItem, requested: i64) -> CoreResult<()> {
    if item.can_sell(requested) {
        return Ok(());
    }

    let available = match item.stock {
        Stock::Tracked(qty) => qty,
        Stock::Untracked => 0,
    };
    Err(CoreError::InsufficientStock {
        item_id: item.id.clone(),
        available,
        requested,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemType;

    fn cola(stock: i64) -> CatalogItem {
        CatalogItem::new("cola", ItemType::Product, Money::new(25.0)).with_stock(Stock::Tracked(stock))
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add_item(&cola(10), 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal().to_cents(), 5000);
    }

    #[test]
    fn test_cart_add_same_item_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&cola(10), 2).unwrap();
        cart.add_item(&cola(10), 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_rejects_more_than_stock() {
        let mut cart = Cart::new();
        cart.add_item(&cola(3), 2).unwrap();

        let err = cart.add_item(&cola(3), 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(cart.quantity_of("cola"), 2);
    }

    #[test]
    fn test_services_and_untracked_skip_stock_check() {
        let mut cart = Cart::new();
        let massage = CatalogItem::new("massage", ItemType::Service, Money::new(500.0))
            .with_stock(Stock::Tracked(0));
        let ice = CatalogItem::new("ice", ItemType::Product, Money::new(5.0));

        cart.add_item(&massage, 3).unwrap();
        cart.add_item(&ice, 50).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_cart_limits() {
        let mut cart = Cart::new();
        let bread = CatalogItem::new("bread", ItemType::Product, Money::new(5.0));
        assert!(matches!(
            cart.add_item(&bread, MAX_ITEM_QUANTITY + 1),
            Err(CoreError::Validation(_))
        ));

        cart.add_item(&bread, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_item(&bread, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));

        let mut full = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            let item = CatalogItem::new(format!("item-{i}"), ItemType::Product, Money::new(1.0));
            full.add_item(&item, 1).unwrap();
        }
        let one_more = CatalogItem::new("straw", ItemType::Product, Money::new(1.0));
        assert!(matches!(
            full.add_item(&one_more, 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_disabled_item_rejected() {
        let mut cart = Cart::new();
        let mut item = cola(10);
        item.enabled = false;
        assert!(matches!(cart.add_item(&item, 1), Err(CoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&cola(5), 1).unwrap();

        cart.update_quantity("cola", 4).unwrap();
        assert_eq!(cart.quantity_of("cola"), 4);

        assert!(cart.update_quantity("cola", 6).is_err());
        assert!(matches!(
            cart.update_quantity("missing", 1),
            Err(CoreError::NotInCart(_))
        ));

        cart.update_quantity("cola", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        cart.add_item(&cola(5), 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
