//! # In-Memory Collaborators
//!
//! Process-local implementations of every collaborator trait, with switches
//! to make individual operations fail. Used by the test suites and for
//! running the pipeline without a database.
//!
//! ## Failure Injection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InMemoryCatalog         fail_stock_writes_for(id), set_unavailable()  │
//! │  InMemorySettings        set_unavailable()                              │
//! │  InMemoryTransactionLog  force_collisions(n), set_fail_inserts()       │
//! │  InMemoryExpenseLedger   set_fail_creates()                             │
//! │  InMemoryTipLedger       set_fail_records()                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use micropos_core::{CatalogItem, Expense, Staff, Stock, TaxRate, TipRecord, Transaction};

use crate::collaborators::{
    Catalog, Collaborators, ExpenseLedger, Settings, StaffDirectory, TipFilter, TipLedger,
    TransactionLog,
};
use crate::error::{RepositoryError, RepositoryResult};

fn injected(what: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("injected failure: {what}"))
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: Mutex<HashMap<String, CatalogItem>>,
    failing_stock_writes: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        InMemoryCatalog {
            items: Mutex::new(items.into_iter().map(|item| (item.id.clone(), item)).collect()),
            ..Default::default()
        }
    }

    pub async fn insert(&self, item: CatalogItem) {
        self.items.lock().await.insert(item.id.clone(), item);
    }

    pub async fn stock_of(&self, item_id: &str) -> Option<Stock> {
        self.items.lock().await.get(item_id).map(|item| item.stock)
    }

    /// Makes every stock write to `item_id` fail.
    pub async fn fail_stock_writes_for(&self, item_id: &str) {
        self.failing_stock_writes.lock().await.insert(item_id.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(injected("catalog offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get(&self, item_id: &str) -> RepositoryResult<Option<CatalogItem>> {
        self.check_available()?;
        Ok(self.items.lock().await.get(item_id).cloned())
    }

    async fn apply_stock_delta(&self, item_id: &str, delta: i64) -> RepositoryResult<()> {
        self.check_available()?;
        if self.failing_stock_writes.lock().await.contains(item_id) {
            return Err(injected(&format!("stock write for {item_id}")));
        }

        let mut items = self.items.lock().await;
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| RepositoryError::not_found("catalog item", item_id))?;
        item.stock = item.stock.apply_delta(delta);
        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug)]
pub struct InMemorySettings {
    default_rate: TaxRate,
    rates: Mutex<HashMap<String, TaxRate>>,
    unavailable: AtomicBool,
}

impl InMemorySettings {
    pub fn new(default_rate: TaxRate) -> Self {
        InMemorySettings {
            default_rate,
            rates: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub async fn set_tax_rate(&self, store_id: &str, rate: TaxRate) {
        self.rates.lock().await.insert(store_id.to_string(), rate);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl Settings for InMemorySettings {
    async fn tax_rate_percent(&self, store_id: &str) -> RepositoryResult<TaxRate> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(injected("settings"));
        }
        Ok(self
            .rates
            .lock()
            .await
            .get(store_id)
            .copied()
            .unwrap_or(self.default_rate))
    }
}

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryStaffDirectory {
    staff: Mutex<Vec<Staff>>,
}

impl InMemoryStaffDirectory {
    pub fn new(staff: Vec<Staff>) -> Self {
        InMemoryStaffDirectory {
            staff: Mutex::new(staff),
        }
    }

    pub async fn add(&self, member: Staff) {
        self.staff.lock().await.push(member);
    }
}

#[async_trait]
impl StaffDirectory for InMemoryStaffDirectory {
    async fn list(&self, store_ids: &[String]) -> RepositoryResult<Vec<Staff>> {
        Ok(self
            .staff
            .lock()
            .await
            .iter()
            .filter(|member| member.store_ids.iter().any(|s| store_ids.contains(s)))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Transaction Log
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    transactions: Mutex<Vec<Transaction>>,
    forced_collisions: AtomicU32,
    fail_inserts: AtomicBool,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` inserts report a duplicate id.
    pub fn force_collisions(&self, n: u32) {
        self.forced_collisions.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// All transactions, in insertion order.
    pub async fn all(&self) -> Vec<Transaction> {
        self.transactions.lock().await.clone()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected("transaction insert"));
        }

        let collide = self
            .forced_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if collide {
            return Err(RepositoryError::duplicate("transaction", transaction.id.clone()));
        }

        let mut transactions = self.transactions.lock().await;
        if transactions.iter().any(|tx| tx.id == transaction.id) {
            return Err(RepositoryError::duplicate("transaction", transaction.id.clone()));
        }
        transactions.push(transaction.clone());
        Ok(())
    }

    async fn remove(&self, transaction_id: &str) -> RepositoryResult<()> {
        self.transactions.lock().await.retain(|tx| tx.id != transaction_id);
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> RepositoryResult<Option<Transaction>> {
        Ok(self
            .transactions
            .lock()
            .await
            .iter()
            .find(|tx| tx.id == transaction_id)
            .cloned())
    }

    async fn mark_refunded(
        &self,
        transaction_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut transactions = self.transactions.lock().await;
        let tx = transactions
            .iter_mut()
            .find(|tx| tx.id == transaction_id)
            .ok_or_else(|| RepositoryError::not_found("transaction", transaction_id))?;
        tx.refund(reason, at)
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }
}

// =============================================================================
// Expense Ledger
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryExpenseLedger {
    expenses: Mutex<Vec<Expense>>,
    fail_creates: AtomicBool,
}

impl InMemoryExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<Expense> {
        self.expenses.lock().await.clone()
    }
}

#[async_trait]
impl ExpenseLedger for InMemoryExpenseLedger {
    async fn create(&self, expense: Expense) -> RepositoryResult<Expense> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected("expense create"));
        }

        let mut expenses = self.expenses.lock().await;
        if expenses.iter().any(|e| e.id == expense.id) {
            return Err(RepositoryError::duplicate("expense", expense.id));
        }
        expenses.push(expense.clone());
        Ok(expense)
    }

    async fn void(&self, expense_id: &str) -> RepositoryResult<()> {
        let mut expenses = self.expenses.lock().await;
        let before = expenses.len();
        expenses.retain(|e| e.id != expense_id);
        if expenses.len() == before {
            return Err(RepositoryError::not_found("expense", expense_id));
        }
        Ok(())
    }

    async fn list(&self, store_id: &str) -> RepositoryResult<Vec<Expense>> {
        Ok(self
            .expenses
            .lock()
            .await
            .iter()
            .filter(|e| e.store_id == store_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Tip Ledger
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryTipLedger {
    tips: Mutex<Vec<TipRecord>>,
    fail_records: AtomicBool,
}

impl InMemoryTipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_records(&self, fail: bool) {
        self.fail_records.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<TipRecord> {
        self.tips.lock().await.clone()
    }
}

#[async_trait]
impl TipLedger for InMemoryTipLedger {
    async fn record(&self, tip: TipRecord) -> RepositoryResult<TipRecord> {
        if self.fail_records.load(Ordering::SeqCst) {
            return Err(injected("tip record"));
        }
        self.tips.lock().await.push(tip.clone());
        Ok(tip)
    }

    async fn settle(&self, store_id: &str, tip_ids: &[String], at: DateTime<Utc>) -> RepositoryResult<usize> {
        let mut tips = self.tips.lock().await;
        let settled = tips
            .iter_mut()
            .filter(|tip| tip.store_id == store_id && tip_ids.contains(&tip.id))
            .map(|tip| tip.settle(at))
            .filter(|changed| *changed)
            .count();
        Ok(settled)
    }

    async fn list(&self, filter: &TipFilter) -> RepositoryResult<Vec<TipRecord>> {
        let mut tips: Vec<TipRecord> = self
            .tips
            .lock()
            .await
            .iter()
            .filter(|tip| filter.matches(tip))
            .cloned()
            .collect();
        tips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tips)
    }
}

// =============================================================================
// Backend
// =============================================================================

/// A full set of in-memory collaborators sharing nothing with the outside.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub catalog: Arc<InMemoryCatalog>,
    pub settings: Arc<InMemorySettings>,
    pub staff: Arc<InMemoryStaffDirectory>,
    pub transactions: Arc<InMemoryTransactionLog>,
    pub expenses: Arc<InMemoryExpenseLedger>,
    pub tips: Arc<InMemoryTipLedger>,
}

impl InMemoryBackend {
    pub fn new(items: impl IntoIterator<Item = CatalogItem>, default_rate: TaxRate) -> Self {
        InMemoryBackend {
            catalog: Arc::new(InMemoryCatalog::new(items)),
            settings: Arc::new(InMemorySettings::new(default_rate)),
            staff: Arc::new(InMemoryStaffDirectory::default()),
            transactions: Arc::new(InMemoryTransactionLog::new()),
            expenses: Arc::new(InMemoryExpenseLedger::new()),
            tips: Arc::new(InMemoryTipLedger::new()),
        }
    }

    /// Collaborators without a staff directory.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            catalog: self.catalog.clone(),
            settings: self.settings.clone(),
            transactions: self.transactions.clone(),
            expenses: self.expenses.clone(),
            tips: self.tips.clone(),
            staff: None,
        }
    }

    /// Collaborators with tip shares checked against the staff directory.
    pub fn collaborators_with_staff(&self) -> Collaborators {
        Collaborators {
            staff: Some(self.staff.clone()),
            ..self.collaborators()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micropos_core::{ItemType, Money, TipMethod, TipShare, TipStatus};

    #[tokio::test]
    async fn test_catalog_stock_delta() {
        let catalog = InMemoryCatalog::new(vec![
            CatalogItem::new("cola", ItemType::Product, Money::new(25.0)).with_stock(Stock::Tracked(10)),
        ]);

        catalog.apply_stock_delta("cola", -4).await.unwrap();
        assert_eq!(catalog.stock_of("cola").await, Some(Stock::Tracked(6)));

        assert!(matches!(
            catalog.apply_stock_delta("ghost", -1).await,
            Err(RepositoryError::NotFound { .. })
        ));

        catalog.fail_stock_writes_for("cola").await;
        assert!(catalog.apply_stock_delta("cola", -1).await.is_err());
        assert_eq!(catalog.stock_of("cola").await, Some(Stock::Tracked(6)));
    }

    #[tokio::test]
    async fn test_forced_collisions_run_out() {
        let log = InMemoryTransactionLog::new();
        log.force_collisions(1);

        let tx = sample_transaction("TX-1");
        assert!(matches!(log.insert(&tx).await, Err(RepositoryError::Duplicate { .. })));
        log.insert(&tx).await.unwrap();
        assert!(matches!(log.insert(&tx).await, Err(RepositoryError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_tip_ledger_settle_and_list() {
        let ledger = InMemoryTipLedger::new();
        let mut older = sample_tip("tip-1");
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        ledger.record(older).await.unwrap();
        ledger.record(sample_tip("tip-2")).await.unwrap();

        let all = ledger.list(&TipFilter::for_store("store-1")).await.unwrap();
        assert_eq!(all.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["tip-2", "tip-1"]);

        let ids = vec!["tip-1".to_string(), "missing".to_string()];
        assert_eq!(ledger.settle("store-1", &ids, Utc::now()).await.unwrap(), 1);
        assert_eq!(ledger.settle("store-1", &ids, Utc::now()).await.unwrap(), 0);

        let unsettled = ledger
            .list(&TipFilter::for_store("store-1").with_status(TipStatus::Unsettled))
            .await
            .unwrap();
        assert_eq!(unsettled.len(), 1);
        assert_eq!(unsettled[0].id, "tip-2");
    }

    fn sample_tip(id: &str) -> TipRecord {
        TipRecord {
            id: id.to_string(),
            store_id: "store-1".to_string(),
            sale_id: "TX-1".to_string(),
            total_tip: Money::new(50.0),
            method: TipMethod::Cash,
            status: TipStatus::Unsettled,
            shares: vec![TipShare::new("ana", Money::new(50.0))],
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    fn sample_transaction(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            store_id: "store-1".to_string(),
            cashier_id: "cashier-1".to_string(),
            items: Vec::new(),
            subtotal: Money::zero(),
            tax: Money::zero(),
            discount_amount: Money::zero(),
            discount_details: None,
            total: Money::zero(),
            timestamp: Utc::now(),
            payment_method: micropos_core::PaymentMethod::Cash,
            status: micropos_core::TransactionStatus::Completed,
            commission_total: Money::zero(),
            staff_id: None,
            refunded_at: None,
            refund_reason: None,
        }
    }
}
