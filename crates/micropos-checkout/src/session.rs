//! # Cart Session
//!
//! One register's order in progress, from first item to committed sale.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  add_item   ┌───────────┐  confirm (Ok)  ┌───────────┐   │
//! │   │  Empty  │ ──────────► │ Populated │ ─────────────► │ Committed │   │
//! │   └─────────┘ ◄────────── └───────────┘                └─────┬─────┘   │
//! │        ▲      last line      │    ▲                          │         │
//! │        │      removed        └────┘ confirm (Err):           │         │
//! │        │                      cart kept as it was            │         │
//! │        └──────────────────── add_item (next order) ──────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The preview totals come from the same calculator as the commit, so the
//! cashier never sees one number and records another.

use tracing::debug;

use micropos_core::{CatalogItem, Cart, CartLine, CoreError, DiscountSpec, OrderTotals, TaxRate};

use crate::checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService, Payment};
use crate::collaborators::Catalog;
use crate::error::CheckoutError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Populated,
    /// The last order went through as this transaction.
    Committed { transaction_id: String },
}

#[derive(Debug, Clone)]
pub struct CartSession {
    store_id: String,
    cashier_id: Option<String>,
    staff_id: Option<String>,
    tax_rate: TaxRate,
    cart: Cart,
    discount: Option<DiscountSpec>,
    state: SessionState,
}

impl CartSession {
    pub fn new(store_id: impl Into<String>, tax_rate: TaxRate) -> Self {
        CartSession {
            store_id: store_id.into(),
            cashier_id: None,
            staff_id: None,
            tax_rate,
            cart: Cart::new(),
            discount: None,
            state: SessionState::Empty,
        }
    }

    /// Opens a session with the store's configured tax rate.
    ///
    /// Fails when the store's settings cannot be read.
    pub async fn open(service: &CheckoutService, store_id: impl Into<String>) -> Result<Self, CheckoutError> {
        let store_id = store_id.into();
        let tax_rate = service.tax_rate_for(&store_id).await?;
        let mut session = CartSession::new(store_id, tax_rate);
        session.cashier_id = service.config().cashier_id.clone();
        Ok(session)
    }

    pub fn with_cashier(mut self, cashier_id: impl Into<String>) -> Self {
        self.cashier_id = Some(cashier_id.into());
        self
    }

    /// Credits the sale to a staff member.
    pub fn set_staff(&mut self, staff_id: Option<String>) {
        self.staff_id = staff_id;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn discount(&self) -> Option<&DiscountSpec> {
        self.discount.as_ref()
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    // -------------------------------------------------------------------------
    // Building the order
    // -------------------------------------------------------------------------

    pub fn add_item(&mut self, item: &CatalogItem, quantity: i64) -> Result<(), CoreError> {
        self.cart.add_item(item, quantity)?;
        self.state = SessionState::Populated;
        Ok(())
    }

    /// Looks the item up in the current catalog, then adds it.
    pub async fn add_item_by_id(
        &mut self,
        catalog: &dyn Catalog,
        item_id: &str,
        quantity: i64,
    ) -> Result<(), CheckoutError> {
        let item = catalog
            .get(item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        self.add_item(&item, quantity)?;
        Ok(())
    }

    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> Result<(), CoreError> {
        self.cart.update_quantity(item_id, quantity)?;
        self.sync_state();
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<(), CoreError> {
        self.cart.remove_item(item_id)?;
        self.sync_state();
        Ok(())
    }

    pub fn set_discount(&mut self, discount: Option<DiscountSpec>) {
        self.discount = discount;
    }

    /// Abandons the order in progress.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.discount = None;
        self.state = SessionState::Empty;
    }

    fn sync_state(&mut self) {
        if self.cart.is_empty() {
            self.state = SessionState::Empty;
        }
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Live order summary.
    pub fn preview(&self) -> OrderTotals {
        CheckoutService::preview(self.cart.lines(), self.discount.as_ref(), self.tax_rate)
    }

    pub fn can_checkout(&self) -> bool {
        !self.cart.is_empty()
    }

    /// Commits the order with `payment`.
    ///
    /// The cart and discount are cleared only when the sale commits. On
    /// error they stay as they were so the cashier can retry.
    pub async fn confirm(&mut self, service: &CheckoutService, payment: Payment) -> Result<CheckoutReceipt, CheckoutError> {
        let request = CheckoutRequest {
            store_id: self.store_id.clone(),
            cashier_id: self.cashier_id.clone(),
            staff_id: self.staff_id.clone(),
            lines: self.cart.lines().to_vec(),
            discount: self.discount.clone(),
            tax_rate: Some(self.tax_rate),
            payment,
        };

        let receipt = service.finalize_checkout(request).await?;

        debug!(tx_id = %receipt.transaction.id, "Clearing cart after commit");
        self.cart.clear();
        self.discount = None;
        self.state = SessionState::Committed {
            transaction_id: receipt.transaction.id.clone(),
        };

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;
    use crate::memory::InMemoryBackend;
    use micropos_core::{ItemType, Money, Stock};

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("cola", ItemType::Product, Money::new(100.0)).with_stock(Stock::Tracked(3)),
            CatalogItem::new("haircut", ItemType::Service, Money::new(100.0)).with_commission(0.1),
        ]
    }

    fn setup() -> (InMemoryBackend, CheckoutService) {
        let backend = InMemoryBackend::new(items(), TaxRate::from_percent(12.0));
        let service = CheckoutService::new(backend.collaborators(), CheckoutConfig::default());
        (backend, service)
    }

    #[tokio::test]
    async fn test_state_machine() {
        let (backend, service) = setup();
        let mut session = CartSession::open(&service, "store-1").await.unwrap();
        assert_eq!(session.state(), &SessionState::Empty);
        assert!(!session.can_checkout());

        session.add_item_by_id(backend.catalog.as_ref(), "cola", 2).await.unwrap();
        assert_eq!(session.state(), &SessionState::Populated);

        session.update_quantity("cola", 0).unwrap();
        assert_eq!(session.state(), &SessionState::Empty);

        session.add_item_by_id(backend.catalog.as_ref(), "haircut", 1).await.unwrap();
        session.set_discount(Some(DiscountSpec::percent(20.0)));

        let preview = session.preview();
        let receipt = session.confirm(&service, Payment::cash()).await.unwrap();
        assert_eq!(preview.total, receipt.transaction.total);
        assert_eq!(
            session.state(),
            &SessionState::Committed {
                transaction_id: receipt.transaction.id.clone()
            }
        );
        assert!(session.lines().is_empty());
        assert!(session.discount().is_none());

        // Next order starts from the committed state
        session.add_item_by_id(backend.catalog.as_ref(), "cola", 1).await.unwrap();
        assert_eq!(session.state(), &SessionState::Populated);
    }

    #[tokio::test]
    async fn test_open_needs_store_settings() {
        let (backend, service) = setup();
        backend.settings.set_tax_rate("store-1", TaxRate::from_percent(5.0)).await;

        let session = CartSession::open(&service, "store-1").await.unwrap();
        assert_eq!(session.tax_rate().percent(), 5.0);

        backend.settings.set_unavailable(true);
        let err = CartSession::open(&service, "store-1").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Repository(_)));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_cart() {
        let (backend, service) = setup();
        let mut session = CartSession::new("store-1", TaxRate::from_percent(12.0)).with_cashier("cashier-1");
        session.add_item_by_id(backend.catalog.as_ref(), "cola", 1).await.unwrap();
        session.set_discount(Some(DiscountSpec::fixed(10.0)));

        backend.transactions.set_fail_inserts(true);
        assert!(session.confirm(&service, Payment::cash()).await.is_err());

        assert_eq!(session.state(), &SessionState::Populated);
        assert_eq!(session.lines().len(), 1);
        assert!(session.discount().is_some());

        backend.transactions.set_fail_inserts(false);
        assert!(session.confirm(&service, Payment::cash()).await.is_ok());
    }

    #[tokio::test]
    async fn test_add_checks_stock_and_existence() {
        let (backend, _service) = setup();
        let mut session = CartSession::new("store-1", TaxRate::zero());

        let err = session
            .add_item_by_id(backend.catalog.as_ref(), "cola", 4)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::InsufficientStock { .. })));

        let err = session
            .add_item_by_id(backend.catalog.as_ref(), "ghost", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::ItemNotFound(_))));
        assert_eq!(session.state(), &SessionState::Empty);
    }

    #[tokio::test]
    async fn test_empty_session_cannot_commit() {
        let (_backend, service) = setup();
        let mut session = CartSession::new("store-1", TaxRate::zero());

        let err = session.confirm(&service, Payment::cash()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
        assert_eq!(session.state(), &SessionState::Empty);
    }
}
