//! # micropos-core: Pure Business Logic for MicroPOS
//!
//! Everything that decides *what* a sale is worth and *what* it consumes,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MicroPOS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    micropos-checkout                            │   │
//! │  │    CartSession ──► CheckoutService ──► TipAllocationRecorder    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ micropos-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │commission │  │   stock   │  │   tips    │  │   │
//! │  │   │  totals   │  │  gross ×  │  │  deltas   │  │ allocation│  │   │
//! │  │   │  tax/disc │  │   rate    │  │  bundles  │  │   split   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    micropos-db (Database Layer)                 │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Transaction, Expense, TipRecord)
//! - [`money`] - Money type, unrounded internally
//! - [`pricing`] - Subtotal, discount, tax, total
//! - [`commission`] - Commission owed on a cart
//! - [`stock`] - Stock consumption resolver
//! - [`tips`] - Tip allocation rules
//! - [`cart`] - Cart building rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use micropos_core::{calculate_totals, CartLine, CatalogItem, DiscountSpec, ItemType, Money, TaxRate};
//!
//! let cart = vec![CartLine::new(
//!     CatalogItem::new("haircut", ItemType::Service, Money::new(100.0)),
//!     1,
//! )];
//!
//! let totals = calculate_totals(&cart, Some(&DiscountSpec::percent(20.0)), TaxRate::from_percent(12.0));
//! assert_eq!(totals.total.to_cents(), 8960);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod commission;
pub mod error;
pub mod money;
pub mod pricing;
pub mod stock;
pub mod tips;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use micropos_core::Money` instead of
// `use micropos_core::money::Money`

pub use cart::Cart;
pub use commission::commission_total;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{calculate_totals, OrderTotals};
pub use stock::{resolve_stock_consumption, CatalogLookup, StockAdjustment, StockDelta};
pub use tips::{split_evenly, validate_allocations};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// `recorded_by` for expenses posted without a signed-in cashier.
pub const SYSTEM_RECORDER: &str = "system_auto";

/// Default tax rate percentage for a store with no setting.
pub const DEFAULT_TAX_RATE_PERCENT: f64 = 12.0;
