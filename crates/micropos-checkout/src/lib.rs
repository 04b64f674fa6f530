//! # micropos-checkout: Checkout Pipeline
//!
//! Commits sales against injected collaborators.
//!
//! ## Usage
//! ```rust,ignore
//! use micropos_checkout::memory::InMemoryBackend;
//! use micropos_checkout::{CartSession, CheckoutConfig, CheckoutService, Payment};
//! use micropos_core::{CatalogItem, ItemType, Money, Stock, TaxRate};
//!
//! let backend = InMemoryBackend::new(
//!     vec![CatalogItem::new("cola", ItemType::Product, Money::new(50.0)).with_stock(Stock::Tracked(10))],
//!     TaxRate::from_percent(12.0),
//! );
//! let service = CheckoutService::new(backend.collaborators(), CheckoutConfig::default());
//!
//! let mut session = CartSession::open(&service, "store-1").await?;
//! session.add_item_by_id(backend.catalog.as_ref(), "cola", 2).await?;
//!
//! let receipt = session.confirm(&service, Payment::cash()).await?;
//! assert_eq!(receipt.transaction.total.to_cents(), 11200);
//! ```
//!
//! ## Modules
//! - [`collaborators`] - Async traits for catalog, settings, staff, ledgers
//! - [`checkout`] - `CheckoutService`: the transaction assembler
//! - [`session`] - `CartSession`: the per-register state machine
//! - [`tips`] - `TipAllocationRecorder`
//! - [`config`] - `CheckoutConfig` (`MICROPOS_*` environment)
//! - [`memory`] - In-memory collaborators with failure injection

pub mod checkout;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod memory;
pub mod session;
pub mod tips;

pub use checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService, Payment, TipOutcome, TipPayment};
pub use collaborators::{
    Catalog, Collaborators, ExpenseLedger, Settings, StaffDirectory, TipFilter, TipLedger,
    TransactionLog,
};
pub use config::CheckoutConfig;
pub use error::{CheckoutError, RepositoryError, RepositoryResult, TipError};
pub use session::{CartSession, SessionState};
pub use tips::TipAllocationRecorder;
