//! # Stock Consumption
//!
//! Works out which inventory counts a sale decrements, and by how much.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each cart line, in cart order:                                     │
//! │                                                                         │
//! │  1. Bundle     menu line ──► each bundle child                          │
//! │                              −(child.qty × line.quantity)               │
//! │                                                                         │
//! │  2. Own stock  non-service line ──► the line item itself                │
//! │                              −line.quantity                             │
//! │                                                                         │
//! │  3. Consumed   any line ──► each consumed child                         │
//! │                              −(child.qty × line.quantity)               │
//! │                                                                         │
//! │  Targets that are services or untracked are skipped silently.          │
//! │  Deltas for the same item are summed across lines and rules.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot vs Current Catalog
//! The line's own type and its bundle/consumed lists come from the cart
//! snapshot, the recipe the customer actually bought. Whether a *target*
//! is tracked is read from the current catalog, since that is the count
//! being decremented. Targets that no longer exist are skipped.
//!
//! No sufficiency check happens here. Stock may go negative.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{CartLine, CatalogItem, ComponentRef, ItemType, Stock};

/// Store-wide low stock threshold used when none is configured.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Catalog Lookup
// =============================================================================

/// Read access to the current catalog, keyed by item id.
pub trait CatalogLookup {
    fn lookup(&self, item_id: &str) -> Option<&CatalogItem>;
}

impl CatalogLookup for HashMap<String, CatalogItem> {
    fn lookup(&self, item_id: &str) -> Option<&CatalogItem> {
        self.get(item_id)
    }
}

impl CatalogLookup for [CatalogItem] {
    fn lookup(&self, item_id: &str) -> Option<&CatalogItem> {
        self.iter().find(|item| item.id == item_id)
    }
}

impl CatalogLookup for Vec<CatalogItem> {
    fn lookup(&self, item_id: &str) -> Option<&CatalogItem> {
        self.as_slice().lookup(item_id)
    }
}

// =============================================================================
// Stock Delta
// =============================================================================

/// Units of one item consumed by a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub item_id: String,
    /// Units consumed (positive means stock goes down).
    pub quantity: i64,
}

impl StockAdjustment {
    /// Signed change to apply to the stock count.
    #[inline]
    pub fn delta(&self) -> i64 {
        -self.quantity
    }
}

/// Aggregated stock consumption for one sale.
///
/// Entries stay in first-touched order so that writes (and their reversal)
/// happen in a deterministic sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDelta(Vec<StockAdjustment>);

impl StockDelta {
    pub fn new() -> Self {
        StockDelta(Vec::new())
    }

    /// Adds `quantity` consumed units of `item_id`, merging with any
    /// existing entry.
    pub fn add(&mut self, item_id: &str, quantity: i64) {
        if quantity == 0 {
            return;
        }

        match self.0.iter_mut().find(|adj| adj.item_id == item_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.0.push(StockAdjustment {
                item_id: item_id.to_string(),
                quantity,
            }),
        }
    }

    /// Units of `item_id` consumed, or 0 if untouched.
    pub fn consumed(&self, item_id: &str) -> i64 {
        self.0
            .iter()
            .find(|adj| adj.item_id == item_id)
            .map_or(0, |adj| adj.quantity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StockAdjustment> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Folds another delta into this one.
    pub fn merge(&mut self, other: &StockDelta) {
        for adj in other.iter() {
            self.add(&adj.item_id, adj.quantity);
        }
    }
}

impl<'a> IntoIterator for &'a StockDelta {
    type Item = &'a StockAdjustment;
    type IntoIter = std::slice::Iter<'a, StockAdjustment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the stock consumed by a set of cart lines.
///
/// ## Example
/// ```rust
/// use micropos_core::{resolve_stock_consumption, CartLine, CatalogItem, ComponentRef, ItemType, Money, Stock};
///
/// let shampoo = CatalogItem::new("shampoo", ItemType::Consumable, Money::zero())
///     .with_stock(Stock::Tracked(10));
/// let haircut = CatalogItem::new("haircut", ItemType::Service, Money::new(150.0))
///     .with_consumed(vec![ComponentRef::new("shampoo", 1)]);
///
/// let catalog = vec![shampoo, haircut.clone()];
/// let delta = resolve_stock_consumption(&[CartLine::new(haircut, 2)], &catalog);
///
/// assert_eq!(delta.consumed("shampoo"), 2);
/// assert_eq!(delta.consumed("haircut"), 0);
/// ```
pub fn resolve_stock_consumption<C>(lines: &[CartLine], catalog: &C) -> StockDelta
where
    C: CatalogLookup + ?Sized,
{
    let mut delta = StockDelta::new();

    for line in lines {
        let item = &line.item;

        // 1. Bundle expansion
        if item.item_type == ItemType::Menu {
            consume_components(&mut delta, &item.bundle_items, line.quantity, catalog);
        }

        // 2. Own stock
        if !item.item_type.is_service() && is_tracked_in(catalog, &item.id) {
            delta.add(&item.id, line.quantity);
        }

        // 3. Consumed items
        consume_components(&mut delta, &item.consumed_items, line.quantity, catalog);
    }

    delta
}

fn consume_components<C>(delta: &mut StockDelta, components: &[ComponentRef], line_qty: i64, catalog: &C)
where
    C: CatalogLookup + ?Sized,
{
    for child in components {
        if is_tracked_in(catalog, &child.item_id) {
            delta.add(&child.item_id, child.effective_qty().saturating_mul(line_qty));
        }
    }
}

fn is_tracked_in<C>(catalog: &C, item_id: &str) -> bool
where
    C: CatalogLookup + ?Sized,
{
    catalog
        .lookup(item_id)
        .map_or(false, CatalogItem::is_stock_tracked)
}

/// Every item id a set of lines could touch: the lines themselves plus their
/// bundle and consumed children, deduplicated in first-seen order.
///
/// Callers fetch exactly these from the catalog before resolving.
pub fn referenced_item_ids(lines: &[CartLine]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut push = |id: &str| {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    };

    for line in lines {
        push(&line.item.id);
        for child in line.item.bundle_items.iter().chain(&line.item.consumed_items) {
            push(&child.item_id);
        }
    }

    ids
}

// =============================================================================
// Stock Helpers
// =============================================================================

/// Tracked item with nothing left on hand.
pub fn is_out_of_stock(item: &CatalogItem) -> bool {
    item.is_stock_tracked() && item.stock.quantity().map_or(false, |qty| qty <= 0)
}

/// Tracked item running low.
///
/// Uses the item's own threshold when set, otherwise `store_threshold`.
pub fn is_low_stock(item: &CatalogItem, store_threshold: i64) -> bool {
    let threshold = item.low_stock_threshold.unwrap_or(store_threshold);
    item.is_stock_tracked()
        && item
            .stock
            .quantity()
            .map_or(false, |qty| qty > 0 && qty <= threshold)
}

/// Stock column text for inventory screens.
pub fn format_stock(item: &CatalogItem) -> String {
    if item.item_type.is_service() {
        return "Unlimited".to_string();
    }

    match item.stock {
        Stock::Tracked(qty) => qty.to_string(),
        Stock::Untracked => "--".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn tracked(id: &str, item_type: ItemType, qty: i64) -> CatalogItem {
        CatalogItem::new(id, item_type, Money::new(10.0)).with_stock(Stock::Tracked(qty))
    }

    fn combo_catalog() -> Vec<CatalogItem> {
        let combo = CatalogItem::new("combo", ItemType::Menu, Money::new(199.0))
            .with_bundle(vec![ComponentRef::new("burger", 1), ComponentRef::new("fries", 2)])
            .with_consumed(vec![ComponentRef::new("paper-bag", 1)]);

        vec![
            combo,
            tracked("burger", ItemType::Ingredient, 50),
            tracked("fries", ItemType::Ingredient, 100),
            tracked("paper-bag", ItemType::Consumable, 20),
        ]
    }

    fn line_for(catalog: &[CatalogItem], id: &str, qty: i64) -> CartLine {
        let item = catalog.lookup(id).cloned().unwrap();
        CartLine::new(item, qty)
    }

    #[test]
    fn test_menu_bundle_and_consumed() {
        let catalog = combo_catalog();
        let delta = resolve_stock_consumption(&[line_for(&catalog, "combo", 3)], &catalog);

        assert_eq!(delta.consumed("burger"), 3);
        assert_eq!(delta.consumed("fries"), 6);
        assert_eq!(delta.consumed("paper-bag"), 3);
        // combo itself is untracked
        assert_eq!(delta.consumed("combo"), 0);
        assert_eq!(delta.len(), 3);
    }

    #[test]
    fn test_oversized_component_qty_saturates() {
        let menu = CatalogItem::new("platter", ItemType::Menu, Money::new(500.0))
            .with_bundle(vec![ComponentRef::new("x", i64::MAX)])
            .with_consumed(vec![ComponentRef::new("x", 1)]);
        let catalog = vec![menu.clone(), tracked("x", ItemType::Ingredient, 10)];

        let delta = resolve_stock_consumption(&[CartLine::new(menu, 2)], &catalog);
        assert_eq!(delta.consumed("x"), i64::MAX);
    }

    #[test]
    fn test_bundle_and_consumed_sum_for_same_target() {
        let menu = CatalogItem::new("set-meal", ItemType::Menu, Money::new(120.0))
            .with_bundle(vec![ComponentRef::new("x", 2)]);
        let side = CatalogItem::new("side", ItemType::Product, Money::new(20.0))
            .with_consumed(vec![ComponentRef::new("x", 1)]);
        let catalog = vec![menu.clone(), side.clone(), tracked("x", ItemType::Ingredient, 10)];

        let only_menu = resolve_stock_consumption(&[CartLine::new(menu.clone(), 3)], &catalog);
        assert_eq!(only_menu.consumed("x"), 6);

        let both = resolve_stock_consumption(&[CartLine::new(menu, 3), CartLine::new(side, 1)], &catalog);
        assert_eq!(both.consumed("x"), 7);
        assert_eq!(catalog[2].stock.apply_delta(-both.consumed("x")), Stock::Tracked(3));
    }

    #[test]
    fn test_service_never_consumes_own_stock() {
        let haircut = tracked("haircut", ItemType::Service, 5)
            .with_consumed(vec![ComponentRef::new("shampoo", 1)]);
        let catalog = vec![haircut.clone(), tracked("shampoo", ItemType::Consumable, 10)];

        let delta = resolve_stock_consumption(&[CartLine::new(haircut, 2)], &catalog);
        assert_eq!(delta.consumed("haircut"), 0);
        assert_eq!(delta.consumed("shampoo"), 2);
    }

    #[test]
    fn test_plain_product_own_stock() {
        let catalog = vec![tracked("cola", ItemType::Product, 24)];
        let delta = resolve_stock_consumption(&[line_for(&catalog, "cola", 4)], &catalog);
        assert_eq!(delta.consumed("cola"), 4);
        assert_eq!(delta.iter().next().map(StockAdjustment::delta), Some(-4));
    }

    #[test]
    fn test_untracked_and_missing_targets_skipped() {
        let item = CatalogItem::new("plate", ItemType::Menu, Money::new(80.0))
            .with_bundle(vec![ComponentRef::new("rice", 1), ComponentRef::new("ghost", 1)]);
        let catalog = vec![
            item.clone(),
            CatalogItem::new("rice", ItemType::Ingredient, Money::zero()),
        ];

        let delta = resolve_stock_consumption(&[CartLine::new(item, 1)], &catalog);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_tracked_state_read_from_current_catalog() {
        // Snapshot says tracked, but the catalog has since stopped tracking it
        let snapshot = tracked("soap", ItemType::Product, 5);
        let current = vec![CatalogItem::new("soap", ItemType::Product, Money::new(10.0))];

        let delta = resolve_stock_consumption(&[CartLine::new(snapshot, 1)], &current);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_zero_component_qty_counts_as_one() {
        let item = CatalogItem::new("meal", ItemType::Menu, Money::new(50.0))
            .with_bundle(vec![ComponentRef::new("rice", 0)]);
        let catalog = vec![item.clone(), tracked("rice", ItemType::Ingredient, 10)];

        let delta = resolve_stock_consumption(&[CartLine::new(item, 2)], &catalog);
        assert_eq!(delta.consumed("rice"), 2);
    }

    #[test]
    fn test_deltas_are_additive_across_lines() {
        let catalog = combo_catalog();
        let a = vec![line_for(&catalog, "combo", 1)];
        let b = vec![line_for(&catalog, "combo", 2), line_for(&catalog, "fries", 5)];

        let mut separate = resolve_stock_consumption(&a, &catalog);
        separate.merge(&resolve_stock_consumption(&b, &catalog));

        let joined: Vec<CartLine> = a.into_iter().chain(b).collect();
        let together = resolve_stock_consumption(&joined, &catalog);

        for id in ["burger", "fries", "paper-bag"] {
            assert_eq!(separate.consumed(id), together.consumed(id), "{id}");
        }
        assert_eq!(together.consumed("fries"), 2 * 3 + 5);
    }

    #[test]
    fn test_stock_may_go_negative() {
        let catalog = vec![tracked("last-one", ItemType::Product, 1)];
        let delta = resolve_stock_consumption(&[line_for(&catalog, "last-one", 3)], &catalog);

        let after = catalog[0].stock.apply_delta(-delta.consumed("last-one"));
        assert_eq!(after, Stock::Tracked(-2));
    }

    #[test]
    fn test_referenced_item_ids() {
        let catalog = combo_catalog();
        let lines = vec![line_for(&catalog, "combo", 1), line_for(&catalog, "burger", 1)];
        assert_eq!(
            referenced_item_ids(&lines),
            vec!["combo", "burger", "fries", "paper-bag"]
        );
    }

    #[test]
    fn test_stock_helpers() {
        let empty = tracked("a", ItemType::Product, 0);
        let low = tracked("b", ItemType::Product, 3);
        let plenty = tracked("c", ItemType::Product, 50);
        let service = tracked("d", ItemType::Service, 0);
        let untracked = CatalogItem::new("e", ItemType::Product, Money::new(1.0));

        assert!(is_out_of_stock(&empty));
        assert!(!is_out_of_stock(&service));
        assert!(!is_out_of_stock(&untracked));

        assert!(is_low_stock(&low, DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(&plenty, DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(&empty, DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(is_low_stock(&plenty.clone().with_low_stock_threshold(60), DEFAULT_LOW_STOCK_THRESHOLD));

        assert_eq!(format_stock(&low), "3");
        assert_eq!(format_stock(&service), "Unlimited");
        assert_eq!(format_stock(&untracked), "--");
    }
}
