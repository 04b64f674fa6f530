//! # Checkout Service
//!
//! Turns a confirmed cart into a committed sale.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      finalize_checkout                                  │
//! │                                                                         │
//! │  1. Guard        cart non-empty, quantities     (EmptyCart, Validation) │
//! │  2. Price        tax rate, totals, commission,  (Repository,            │
//! │                  cash tender covers total        InsufficientTender)    │
//! │  ── store lock acquired ────────────────────────────────────────────── │
//! │  3. Transaction  insert, retry on id collision  (IdExhausted)           │
//! │  4. Expense      COMMISSIONS if commission > 0  undo: remove tx         │
//! │  5. Stock        apply each delta               undo: reverse deltas,   │
//! │                                                       void expense,     │
//! │                                                       remove tx         │
//! │  ── sale committed ─────────────────────────────────────────────────── │
//! │  6. Tip          best effort, reported in TipOutcome                    │
//! │  ── store lock released ────────────────────────────────────────────── │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 3 to 5 are all-or-nothing as seen from outside: when one fails the
//! earlier writes are taken back before the error is returned.
//!
//! ## Concurrency
//! Checkouts for the same store run one at a time inside a process. Across
//! processes, stock writes are relative deltas so none are lost, but two
//! registers can still oversell the last unit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use micropos_core::stock::referenced_item_ids;
use micropos_core::validation::validate_quantity;
use micropos_core::{
    calculate_totals, commission_total, resolve_stock_consumption, CartLine, CatalogItem,
    CoreError, DiscountSpec, Expense, Money, OrderTotals, PaymentMethod, StockAdjustment,
    StockDelta, TaxRate, TipInput, TipMethod, TipRecord, TipShare, Transaction,
    TransactionStatus, MAX_CART_ITEMS,
};

use crate::collaborators::{Catalog, Collaborators, ExpenseLedger, Settings, TransactionLog};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, RepositoryError};
use crate::tips::TipAllocationRecorder;

// =============================================================================
// Request / Receipt
// =============================================================================

/// A tip given along with the payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipPayment {
    pub amount: Money,
    #[serde(default)]
    pub method: TipMethod,
    #[serde(default)]
    pub allocations: Vec<TipShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    /// Cash handed over. `None` means the exact amount; ignored for card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendered: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<TipPayment>,
}

impl Payment {
    pub fn cash() -> Self {
        Payment {
            method: PaymentMethod::Cash,
            tendered: None,
            tip: None,
        }
    }

    /// Cash payment with the amount the customer handed over.
    pub fn cash_tendered(amount: Money) -> Self {
        Payment {
            tendered: Some(amount),
            ..Payment::cash()
        }
    }

    pub fn card() -> Self {
        Payment {
            method: PaymentMethod::Card,
            tendered: None,
            tip: None,
        }
    }

    /// Change owed on a sale of `total`.
    ///
    /// ## When This Fails
    /// Cash tendered below the total, compared in whole cents.
    pub fn change_due(&self, total: Money) -> Result<Money, CoreError> {
        let tendered = match (self.method, self.tendered) {
            (PaymentMethod::Cash, Some(tendered)) => tendered,
            _ => return Ok(Money::zero()),
        };

        if !tendered.is_finite() || tendered.to_cents() < total.to_cents() {
            return Err(CoreError::InsufficientTender { tendered, total });
        }
        Ok(Money::from_cents(tendered.to_cents() - total.to_cents()))
    }

    pub fn with_tip(mut self, tip: TipPayment) -> Self {
        self.tip = Some(tip);
        self
    }
}

/// Everything needed to commit one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub store_id: String,
    /// Cashier ringing up the sale; falls back to the configured cashier.
    #[serde(default)]
    pub cashier_id: Option<String>,
    /// Staff member credited with the sale.
    #[serde(default)]
    pub staff_id: Option<String>,
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub discount: Option<DiscountSpec>,
    /// Overrides the store's configured rate when set.
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
    pub payment: Payment,
}

/// How the tip step went. Reported separately from the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TipOutcome {
    NotRequested,
    Recorded(TipRecord),
    /// The sale committed but the tip did not; the reason is for the
    /// operator toast.
    Failed(String),
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub transaction: Transaction,
    pub commission_expense: Option<Expense>,
    pub stock_delta: StockDelta,
    /// Cash to hand back; zero for card and exact cash.
    pub change_due: Money,
    pub tip: TipOutcome,
}

// =============================================================================
// Service
// =============================================================================

pub struct CheckoutService {
    catalog: Arc<dyn Catalog>,
    settings: Arc<dyn Settings>,
    transactions: Arc<dyn TransactionLog>,
    expenses: Arc<dyn ExpenseLedger>,
    tips: TipAllocationRecorder,
    config: CheckoutConfig,
    store_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CheckoutService {
    pub fn new(collaborators: Collaborators, config: CheckoutConfig) -> Self {
        CheckoutService {
            catalog: collaborators.catalog,
            settings: collaborators.settings,
            transactions: collaborators.transactions,
            expenses: collaborators.expenses,
            tips: TipAllocationRecorder::new(collaborators.tips, collaborators.staff),
            config,
            store_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Tip recorder sharing this service's ledger and staff directory.
    pub fn tips(&self) -> &TipAllocationRecorder {
        &self.tips
    }

    /// Tax rate configured for a store.
    ///
    /// A settings failure is returned, never replaced by a default: a sale
    /// must not be taxed at a rate the store did not set.
    pub async fn tax_rate_for(&self, store_id: &str) -> Result<TaxRate, RepositoryError> {
        self.settings.tax_rate_percent(store_id).await.map_err(|e| {
            error!(store_id = %store_id, error = %e, "Could not read store tax rate");
            e
        })
    }

    /// Totals for the order summary, computed exactly as a commit would.
    pub fn preview(lines: &[CartLine], discount: Option<&DiscountSpec>, tax_rate: TaxRate) -> OrderTotals {
        calculate_totals(lines, discount, tax_rate)
    }

    /// Commits a sale.
    ///
    /// On `Err` nothing was persisted: any partial writes were undone.
    /// On `Ok` the sale is committed; check `receipt.tip` for the tip step.
    pub async fn finalize_checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, CheckoutError> {
        // 1. Guard
        if request.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if request.lines.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS }.into());
        }
        for line in &request.lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        // 2. Price
        let tax_rate = match request.tax_rate {
            Some(rate) => rate,
            None => self.tax_rate_for(&request.store_id).await?,
        };
        let totals = calculate_totals(&request.lines, request.discount.as_ref(), tax_rate);
        let commission = commission_total(&request.lines);
        let change_due = request.payment.change_due(totals.total)?;

        debug!(
            store_id = %request.store_id,
            lines = request.lines.len(),
            subtotal = %totals.subtotal,
            total = %totals.total,
            commission = %commission,
            "Pricing checkout"
        );

        let _store_guard = self.lock_store(&request.store_id).await;

        let current = self.current_catalog(&request.lines).await?;
        let delta = resolve_stock_consumption(&request.lines, &current);

        let cashier_id = request
            .cashier_id
            .clone()
            .or_else(|| self.config.cashier_id.clone())
            .unwrap_or_else(|| micropos_core::SYSTEM_RECORDER.to_string());
        let recorder = request
            .cashier_id
            .as_deref()
            .unwrap_or_else(|| self.config.recorder())
            .to_string();

        // 3. Transaction
        let now = Utc::now();
        let mut transaction = Transaction {
            id: String::new(),
            store_id: request.store_id.clone(),
            cashier_id,
            items: request.lines,
            subtotal: totals.subtotal,
            tax: totals.tax_amount,
            discount_amount: totals.discount_amount,
            discount_details: request.discount,
            total: totals.total,
            timestamp: now,
            payment_method: request.payment.method,
            status: TransactionStatus::Completed,
            commission_total: commission,
            staff_id: request.staff_id,
            refunded_at: None,
            refund_reason: None,
        };
        self.insert_with_fresh_id(&mut transaction).await?;

        // 4. Commission expense
        let commission_expense = match Expense::commission_for(&transaction, &recorder) {
            Some(expense) => match self.expenses.create(expense).await {
                Ok(created) => Some(created),
                Err(e) => {
                    error!(tx_id = %transaction.id, error = %e, "Commission expense failed, undoing sale");
                    self.remove_transaction(&transaction.id).await;
                    return Err(e.into());
                }
            },
            None => None,
        };

        // 5. Stock
        if let Err(e) = self.apply_stock(&delta).await {
            error!(tx_id = %transaction.id, error = %e, "Stock update failed, undoing sale");
            if let Some(expense) = &commission_expense {
                if let Err(void_err) = self.expenses.void(&expense.id).await {
                    warn!(expense_id = %expense.id, error = %void_err, "Could not void commission expense");
                }
            }
            self.remove_transaction(&transaction.id).await;
            return Err(e.into());
        }

        info!(
            tx_id = %transaction.id,
            store_id = %transaction.store_id,
            total = %transaction.total,
            stock_items = delta.len(),
            "Sale committed"
        );

        // 6. Tip
        let tip = self.record_tip(&transaction, request.payment.tip).await;

        Ok(CheckoutReceipt {
            transaction,
            commission_expense,
            stock_delta: delta,
            change_due,
            tip,
        })
    }

    /// Marks a completed sale refunded.
    ///
    /// Status only: stock is not returned and the commission expense stays.
    pub async fn refund_transaction(
        &self,
        store_id: &str,
        transaction_id: &str,
        reason: &str,
    ) -> Result<Transaction, CheckoutError> {
        let mut transaction = self
            .transactions
            .get(transaction_id)
            .await?
            .filter(|tx| tx.store_id == store_id)
            .ok_or_else(|| RepositoryError::not_found("transaction", transaction_id))?;

        let now = Utc::now();
        transaction.refund(reason, now)?;
        self.transactions.mark_refunded(transaction_id, reason, now).await?;

        info!(tx_id = %transaction_id, reason = %reason, "Transaction refunded");
        Ok(transaction)
    }

    // -------------------------------------------------------------------------
    // Steps
    // -------------------------------------------------------------------------

    async fn lock_store(&self, store_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.store_locks.lock().await;
            locks.entry(store_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn current_catalog(&self, lines: &[CartLine]) -> Result<HashMap<String, CatalogItem>, CheckoutError> {
        let ids = referenced_item_ids(lines);
        let items = self.catalog.get_many(&ids).await?;
        Ok(items.into_iter().map(|item| (item.id.clone(), item)).collect())
    }

    async fn insert_with_fresh_id(&self, transaction: &mut Transaction) -> Result<(), CheckoutError> {
        let attempts = self.config.max_id_attempts.max(1);

        for attempt in 1..=attempts {
            transaction.id = Transaction::generate_id(transaction.timestamp);
            match self.transactions.insert(transaction).await {
                Ok(()) => return Ok(()),
                Err(RepositoryError::Duplicate { .. }) => {
                    debug!(tx_id = %transaction.id, attempt, "Transaction id collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(attempts, "Could not allocate a transaction id");
        Err(CheckoutError::IdExhausted { attempts })
    }

    /// Applies every delta in order. On failure, reverses the ones already
    /// applied and returns the original error.
    async fn apply_stock(&self, delta: &StockDelta) -> Result<(), RepositoryError> {
        let mut applied: Vec<&StockAdjustment> = Vec::with_capacity(delta.len());

        for adj in delta {
            if let Err(e) = self.catalog.apply_stock_delta(&adj.item_id, adj.delta()).await {
                for done in applied.iter().rev() {
                    if let Err(undo_err) = self.catalog.apply_stock_delta(&done.item_id, -done.delta()).await {
                        warn!(item_id = %done.item_id, error = %undo_err, "Could not reverse stock delta");
                    }
                }
                return Err(e);
            }
            applied.push(adj);
        }

        Ok(())
    }

    async fn remove_transaction(&self, transaction_id: &str) {
        if let Err(e) = self.transactions.remove(transaction_id).await {
            warn!(tx_id = %transaction_id, error = %e, "Could not remove transaction");
        }
    }

    async fn record_tip(&self, transaction: &Transaction, tip: Option<TipPayment>) -> TipOutcome {
        let tip = match tip {
            Some(tip) if tip.amount.is_positive() => tip,
            _ => return TipOutcome::NotRequested,
        };

        let input = TipInput {
            store_id: transaction.store_id.clone(),
            sale_id: transaction.id.clone(),
            total_tip: tip.amount,
            method: tip.method,
            allocations: tip.allocations,
        };

        match self.tips.record(input).await {
            Ok(record) => TipOutcome::Recorded(record),
            Err(e) => {
                warn!(tx_id = %transaction.id, error = %e, "Tip not recorded; sale stands");
                TipOutcome::Failed(e.to_string())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
