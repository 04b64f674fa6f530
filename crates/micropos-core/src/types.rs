//! # Domain Types
//!
//! Core domain types used throughout MicroPOS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │   Transaction   │   │   TipRecord     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (TX-...)    │   │  sale_id (FK)   │       │
//! │  │  price / cost   │   │  items (lines)  │   │  total_tip      │       │
//! │  │  stock (enum)   │   │  totals         │   │  shares         │       │
//! │  │  item_type      │   │  commission     │   │  status         │       │
//! │  │  bundle/consumed│   │  status         │   └─────────────────┘       │
//! │  └────────┬────────┘   └────────┬────────┘                              │
//! │           │ snapshot            │ commission > 0                        │
//! │           ▼                     ▼                                       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │    Expense      │   │     Staff       │       │
//! │  │  item + qty     │   │  COMMISSIONS    │   │  store_ids      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a percentage (12.0 = 12%).
///
/// Negative or non-finite rates normalize to zero so that tax can never
/// reduce a total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(f64);

impl TaxRate {
    /// Creates a tax rate from a percentage.
    ///
    /// ```rust
    /// use micropos_core::TaxRate;
    ///
    /// assert_eq!(TaxRate::from_percent(12.0).percent(), 12.0);
    /// assert_eq!(TaxRate::from_percent(-3.0).percent(), 0.0);
    /// ```
    pub fn from_percent(pct: f64) -> Self {
        if pct.is_finite() && pct > 0.0 {
            TaxRate(pct)
        } else {
            TaxRate(0.0)
        }
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> f64 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0.0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// What kind of thing a catalog entry is.
///
/// The type drives stock behavior: services represent labor or time and never
/// consume their own stock; menus expand into their bundle children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Product,
    Service,
    Menu,
    Ingredient,
    Consumable,
}

impl ItemType {
    #[inline]
    pub fn is_service(&self) -> bool {
        matches!(self, ItemType::Service)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Service => "service",
            ItemType::Menu => "menu",
            ItemType::Ingredient => "ingredient",
            ItemType::Consumable => "consumable",
        }
    }

    /// Parses the stored form. Unknown or empty values fall back to
    /// `Product`, matching catalogs that predate item types.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "service" => ItemType::Service,
            "menu" => ItemType::Menu,
            "ingredient" => ItemType::Ingredient,
            "consumable" => ItemType::Consumable,
            _ => ItemType::Product,
        }
    }
}

/// Inventory state of a catalog item.
///
/// Replaces the "infinite stock" numeric sentinel with an explicit state.
/// ```json
/// { "state": "tracked", "quantity": 10 }
/// { "state": "untracked" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", content = "quantity", rename_all = "snake_case")]
pub enum Stock {
    /// Finite on-hand count. May go negative; sufficiency is only checked
    /// when adding to the cart.
    Tracked(i64),
    /// Unlimited / not counted.
    #[default]
    Untracked,
}

impl Stock {
    /// Returns the on-hand count for tracked stock.
    #[inline]
    pub fn quantity(&self) -> Option<i64> {
        match self {
            Stock::Tracked(qty) => Some(*qty),
            Stock::Untracked => None,
        }
    }

    /// Applies a signed delta. Untracked stock absorbs any delta unchanged.
    pub fn apply_delta(self, delta: i64) -> Stock {
        match self {
            Stock::Tracked(qty) => Stock::Tracked(qty + delta),
            Stock::Untracked => Stock::Untracked,
        }
    }

    /// Maps a nullable column (NULL = untracked) into a Stock.
    pub fn from_column(value: Option<i64>) -> Stock {
        value.map_or(Stock::Untracked, Stock::Tracked)
    }
}

/// A reference from a composite item to a child item.
///
/// Used for both `bundle_items` (menus) and `consumed_items` (supplies used up
/// by a sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRef {
    pub item_id: String,
    #[serde(default = "default_component_qty")]
    pub qty: i64,
}

fn default_component_qty() -> i64 {
    1
}

impl ComponentRef {
    pub fn new(item_id: impl Into<String>, qty: i64) -> Self {
        ComponentRef {
            item_id: item_id.into(),
            qty,
        }
    }

    /// Quantity of the child consumed per unit of the parent.
    ///
    /// A zero or negative quantity is treated as 1: a listed child is always
    /// consumed at least once.
    #[inline]
    pub fn effective_qty(&self) -> i64 {
        if self.qty > 0 {
            self.qty
        } else {
            1
        }
    }
}

/// An entry in the store catalog: product, service, menu, ingredient or
/// consumable.
///
/// Read-only to the checkout pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,

    #[serde(default)]
    pub store_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub sku: String,

    pub price: Money,

    #[serde(default)]
    pub cost: Money,

    #[serde(default)]
    pub stock: Stock,

    #[serde(default)]
    pub item_type: ItemType,

    #[serde(default)]
    pub is_commissionable: bool,

    /// Fraction in [0, 1], e.g. 0.35 for 35%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,

    /// Menu composition. Only meaningful for `ItemType::Menu`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundle_items: Vec<ComponentRef>,

    /// Supplies used up whenever this item is sold, for any item type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumed_items: Vec<ComponentRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CatalogItem {
    /// Creates an enabled, untracked, non-commissionable item.
    pub fn new(id: impl Into<String>, item_type: ItemType, price: Money) -> Self {
        let id = id.into();
        CatalogItem {
            name: id.clone(),
            sku: id.to_uppercase(),
            id,
            store_id: String::new(),
            price,
            cost: Money::zero(),
            stock: Stock::Untracked,
            item_type,
            is_commissionable: false,
            commission_rate: None,
            bundle_items: Vec::new(),
            consumed_items: Vec::new(),
            low_stock_threshold: None,
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = store_id.into();
        self
    }

    pub fn with_cost(mut self, cost: Money) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_stock(mut self, stock: Stock) -> Self {
        self.stock = stock;
        self
    }

    /// Marks the item commissionable at `rate` (fraction).
    pub fn with_commission(mut self, rate: f64) -> Self {
        self.is_commissionable = true;
        self.commission_rate = Some(rate);
        self
    }

    pub fn with_bundle(mut self, children: Vec<ComponentRef>) -> Self {
        self.bundle_items = children;
        self
    }

    pub fn with_consumed(mut self, children: Vec<ComponentRef>) -> Self {
        self.consumed_items = children;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    /// Whether sales decrement this item's count.
    ///
    /// Services are never stock-tracked, whatever their `stock` says.
    #[inline]
    pub fn is_stock_tracked(&self) -> bool {
        !self.item_type.is_service() && matches!(self.stock, Stock::Tracked(_))
    }

    /// Checks if `quantity` can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        match self.stock {
            Stock::Tracked(available) if self.is_stock_tracked() => available >= quantity,
            _ => true,
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A catalog item snapshot plus the quantity ordered.
///
/// ## Snapshot Pattern
/// Price, cost, commission and composition are frozen when the item is added
/// to the cart. Later catalog edits do not affect an order in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(item: CatalogItem, quantity: i64) -> Self {
        CartLine { item, quantity }
    }

    #[inline]
    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    /// Gross line revenue (price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.item.price.times_quantity(self.quantity)
    }
}

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal.
    Percent,
    /// `value` is an absolute amount.
    Fixed,
}

/// An order-level discount as entered by the cashier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSpec {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: f64,
    /// Display label ("Senior Citizen", "Promo").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DiscountSpec {
    pub fn percent(value: f64) -> Self {
        DiscountSpec {
            kind: DiscountKind::Percent,
            value,
            name: None,
        }
    }

    pub fn fixed(value: f64) -> Self {
        DiscountSpec {
            kind: DiscountKind::Fixed,
            value,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The unclamped discount this spec asks for against `subtotal`.
    pub fn raw_amount(&self, subtotal: Money) -> Money {
        match self.kind {
            DiscountKind::Percent => subtotal.percent(self.value),
            DiscountKind::Fixed => Money::new(self.value),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

// =============================================================================
// Transaction
// =============================================================================

/// The status of a committed transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Refunded,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// A committed sale.
///
/// Created exactly once per checkout confirmation and immutable afterwards,
/// except for the refund transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub store_id: String,
    pub cashier_id: String,
    pub items: Vec<CartLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount_amount: Money,
    pub discount_details: Option<DiscountSpec>,
    pub total: Money,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    /// Booked separately as a COMMISSIONS expense; never deducted from `total`.
    pub commission_total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
}

impl Transaction {
    /// Generates a transaction id: `TX-<unix millis>-<random hex>`.
    ///
    /// Ids sort by time. The random suffix keeps two registers committing
    /// in the same millisecond apart; the log still rejects the rare
    /// collision and the caller retries with a fresh id.
    pub fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("TX-{}-{}", now.timestamp_millis(), &suffix[..8])
    }

    /// Moves a completed transaction to `Refunded`.
    ///
    /// Status-only: stock and commission expenses are left as they are.
    pub fn refund(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> CoreResult<()> {
        if self.status != TransactionStatus::Completed {
            return Err(CoreError::InvalidTransactionStatus {
                transaction_id: self.id.clone(),
                current_status: self.status.to_string(),
            });
        }

        self.status = TransactionStatus::Refunded;
        self.refunded_at = Some(at);
        self.refund_reason = Some(reason.into());
        Ok(())
    }
}

// =============================================================================
// Expense
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ExpenseCategory {
    Payroll,
    Rent,
    Utilities,
    Marketing,
    Supplies,
    Maintenance,
    Other,
    #[serde(rename = "COMMISSIONS")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "COMMISSIONS"))]
    Commissions,
}

/// An operating expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub store_id: String,
    /// User id, or [`crate::SYSTEM_RECORDER`] for auto-posted entries.
    pub recorded_by: String,
    pub description: String,
    pub amount: Money,
    pub category: ExpenseCategory,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub approved: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Id of the commission expense posted for `transaction_id`.
    pub fn commission_id(transaction_id: &str) -> String {
        format!("comm-{}", transaction_id)
    }

    /// Builds the auto-approved COMMISSIONS expense for a transaction.
    ///
    /// Returns `None` when the transaction earned no commission.
    pub fn commission_for(transaction: &Transaction, recorded_by: &str) -> Option<Expense> {
        if !transaction.commission_total.is_positive() {
            return None;
        }

        Some(Expense {
            id: Expense::commission_id(&transaction.id),
            store_id: transaction.store_id.clone(),
            recorded_by: recorded_by.to_string(),
            description: format!("Auto: Commissions for transaction {}", transaction.id),
            amount: transaction.commission_total,
            category: ExpenseCategory::Commissions,
            date: transaction.timestamp,
            approved: true,
            created_at: transaction.timestamp,
        })
    }
}

// =============================================================================
// Tips
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TipMethod {
    #[default]
    Cash,
    Card,
    Gcash,
    Other,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TipStatus {
    Unsettled,
    Settled,
}

/// One staff member's portion of a tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipShare {
    pub staff_id: String,
    pub amount: Money,
}

impl TipShare {
    pub fn new(staff_id: impl Into<String>, amount: Money) -> Self {
        TipShare {
            staff_id: staff_id.into(),
            amount,
        }
    }
}

/// A request to record a tip against a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipInput {
    pub store_id: String,
    pub sale_id: String,
    pub total_tip: Money,
    pub method: TipMethod,
    #[serde(default)]
    pub allocations: Vec<TipShare>,
}

/// A recorded tip, split across staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipRecord {
    pub id: String,
    pub store_id: String,
    pub sale_id: String,
    pub total_tip: Money,
    pub method: TipMethod,
    pub status: TipStatus,
    pub shares: Vec<TipShare>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub settled_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    #[default]
    Staff,
    Cashier,
    Therapist,
    Barber,
    Waiter,
    Other,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Staff => "STAFF",
            StaffRole::Cashier => "CASHIER",
            StaffRole::Therapist => "THERAPIST",
            StaffRole::Barber => "BARBER",
            StaffRole::Waiter => "WAITER",
            StaffRole::Other => "OTHER",
        }
    }

    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASHIER" => StaffRole::Cashier,
            "THERAPIST" => StaffRole::Therapist,
            "BARBER" => StaffRole::Barber,
            "WAITER" => StaffRole::Waiter,
            "OTHER" => StaffRole::Other,
            _ => StaffRole::Staff,
        }
    }
}

/// A staff member who can receive tip shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: StaffRole,
    pub store_ids: Vec<String>,
    pub is_active: bool,
}

impl Staff {
    /// Whether this person can be allocated tips at `store_id`.
    pub fn works_at(&self, store_id: &str) -> bool {
        self.is_active && self.store_ids.iter().any(|s| s == store_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_normalization() {
        assert_eq!(TaxRate::from_percent(12.0).percent(), 12.0);
        assert!(TaxRate::from_percent(-1.0).is_zero());
        assert!(TaxRate::from_percent(f64::NAN).is_zero());
    }

    #[test]
    fn test_service_is_never_stock_tracked() {
        let haircut =
            CatalogItem::new("haircut", ItemType::Service, Money::new(150.0)).with_stock(Stock::Tracked(5));
        assert!(!haircut.is_stock_tracked());

        let shampoo =
            CatalogItem::new("shampoo", ItemType::Consumable, Money::zero()).with_stock(Stock::Tracked(5));
        assert!(shampoo.is_stock_tracked());

        let water = CatalogItem::new("water", ItemType::Product, Money::new(10.0));
        assert!(!water.is_stock_tracked());
    }

    #[test]
    fn test_can_sell() {
        let item = CatalogItem::new("soap", ItemType::Product, Money::new(25.0)).with_stock(Stock::Tracked(3));
        assert!(item.can_sell(3));
        assert!(!item.can_sell(4));

        let untracked = CatalogItem::new("ice", ItemType::Product, Money::new(5.0));
        assert!(untracked.can_sell(1000));
    }

    #[test]
    fn test_stock_apply_delta() {
        assert_eq!(Stock::Tracked(10).apply_delta(-6), Stock::Tracked(4));
        assert_eq!(Stock::Tracked(1).apply_delta(-3), Stock::Tracked(-2));
        assert_eq!(Stock::Untracked.apply_delta(-3), Stock::Untracked);
    }

    #[test]
    fn test_stock_serialization() {
        let json = serde_json::to_string(&Stock::Tracked(10)).unwrap();
        assert_eq!(json, r#"{"state":"tracked","quantity":10}"#);

        let json = serde_json::to_string(&Stock::Untracked).unwrap();
        assert_eq!(json, r#"{"state":"untracked"}"#);
    }

    #[test]
    fn test_component_effective_qty() {
        assert_eq!(ComponentRef::new("x", 2).effective_qty(), 2);
        assert_eq!(ComponentRef::new("x", 0).effective_qty(), 1);

        let parsed: ComponentRef = serde_json::from_str(r#"{"itemId":"x"}"#).unwrap();
        assert_eq!(parsed.qty, 1);
    }

    #[test]
    fn test_discount_spec_wire_format() {
        let parsed: DiscountSpec = serde_json::from_str(r#"{"type":"percent","value":20}"#).unwrap();
        assert_eq!(parsed, DiscountSpec::percent(20.0));
    }

    #[test]
    fn test_cart_line_flattens_item() {
        let line = CartLine::new(CatalogItem::new("cola", ItemType::Product, Money::new(30.0)), 2);
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["id"], "cola");
        assert_eq!(value["quantity"], 2);
        assert_eq!(line.line_total(), Money::new(60.0));
    }

    #[test]
    fn test_expense_category_wire_format() {
        let json = serde_json::to_string(&ExpenseCategory::Commissions).unwrap();
        assert_eq!(json, r#""COMMISSIONS""#);
    }

    #[test]
    fn test_transaction_id_format() {
        let now = Utc::now();
        let a = Transaction::generate_id(now);
        let b = Transaction::generate_id(now);

        assert!(a.starts_with(&format!("TX-{}-", now.timestamp_millis())));
        assert_eq!(a.rsplit('-').next().map(str::len), Some(8));
        assert_ne!(a, b);
    }

    #[test]
    fn test_staff_works_at() {
        let staff = Staff {
            id: "ana".to_string(),
            name: "Ana".to_string(),
            role: StaffRole::Barber,
            store_ids: vec!["store-1".to_string()],
            is_active: true,
        };
        assert!(staff.works_at("store-1"));
        assert!(!staff.works_at("store-2"));

        let inactive = Staff { is_active: false, ..staff };
        assert!(!inactive.works_at("store-1"));
    }
}
