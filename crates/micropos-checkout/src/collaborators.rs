//! # Collaborators
//!
//! The outside world as the checkout pipeline sees it.
//!
//! ## Who Owns What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait            Reads                    Writes                      │
//! │  ─────            ─────                    ──────                      │
//! │  Catalog          current items            stock deltas                │
//! │  Settings         store tax rate           -                           │
//! │  StaffDirectory   staff per store          -                           │
//! │  TransactionLog   transactions             insert / remove / refund    │
//! │  ExpenseLedger    expenses                 create / void               │
//! │  TipLedger        tips                     record / settle             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write has an undo (`remove`, `void`, the negated stock delta) so a
//! failed checkout can take back what it already wrote.
//!
//! Implementations: `micropos_db` (SQLite) and [`crate::memory`] (tests).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use micropos_core::{CatalogItem, Expense, Staff, TaxRate, TipRecord, TipStatus, Transaction};

use crate::error::RepositoryResult;

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get(&self, item_id: &str) -> RepositoryResult<Option<CatalogItem>>;

    /// Adds `delta` to a tracked item's stock (negative = consumed).
    ///
    /// Must be a relative update, never read-modify-write, so that
    /// concurrent registers cannot lose each other's decrements.
    async fn apply_stock_delta(&self, item_id: &str, delta: i64) -> RepositoryResult<()>;

    /// Fetches several items at once. Missing ids are left out.
    async fn get_many(&self, item_ids: &[String]) -> RepositoryResult<Vec<CatalogItem>> {
        let mut items = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if let Some(item) = self.get(id).await? {
                items.push(item);
            }
        }
        Ok(items)
    }
}

// =============================================================================
// Settings / Staff
// =============================================================================

#[async_trait]
pub trait Settings: Send + Sync {
    /// Tax rate configured for the store.
    async fn tax_rate_percent(&self, store_id: &str) -> RepositoryResult<TaxRate>;
}

#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Staff assigned to any of `store_ids`.
    async fn list(&self, store_ids: &[String]) -> RepositoryResult<Vec<Staff>>;
}

// =============================================================================
// Ledgers
// =============================================================================

#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Persists a new transaction.
    ///
    /// Fails with `RepositoryError::Duplicate` if the id is taken.
    async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()>;

    /// Deletes a transaction. Used only to undo a failed checkout.
    async fn remove(&self, transaction_id: &str) -> RepositoryResult<()>;

    async fn get(&self, transaction_id: &str) -> RepositoryResult<Option<Transaction>>;

    async fn mark_refunded(
        &self,
        transaction_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    async fn create(&self, expense: Expense) -> RepositoryResult<Expense>;

    /// Deletes an expense. Used only to undo a failed checkout.
    async fn void(&self, expense_id: &str) -> RepositoryResult<()>;

    async fn list(&self, store_id: &str) -> RepositoryResult<Vec<Expense>>;
}

#[async_trait]
pub trait TipLedger: Send + Sync {
    async fn record(&self, tip: TipRecord) -> RepositoryResult<TipRecord>;

    /// Marks the listed unsettled tips of `store_id` settled.
    ///
    /// Returns how many changed. Already-settled or unknown ids are ignored.
    async fn settle(&self, store_id: &str, tip_ids: &[String], at: DateTime<Utc>) -> RepositoryResult<usize>;

    /// Tips matching `filter`, newest first.
    async fn list(&self, filter: &TipFilter) -> RepositoryResult<Vec<TipRecord>>;
}

/// Query for [`TipLedger::list`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipFilter {
    pub store_id: String,
    pub status: Option<TipStatus>,
    /// Only tips with a share for this staff member.
    pub staff_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TipFilter {
    pub fn for_store(store_id: impl Into<String>) -> Self {
        TipFilter {
            store_id: store_id.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TipStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_staff(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Whether `tip` passes the filter. Date bounds are inclusive.
    pub fn matches(&self, tip: &TipRecord) -> bool {
        if tip.store_id != self.store_id {
            return false;
        }
        if self.status.map_or(false, |status| tip.status != status) {
            return false;
        }
        if let Some(staff_id) = &self.staff_id {
            if !tip.shares.iter().any(|share| &share.staff_id == staff_id) {
                return false;
            }
        }
        if self.from.map_or(false, |from| tip.created_at < from) {
            return false;
        }
        if self.to.map_or(false, |to| tip.created_at > to) {
            return false;
        }
        true
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// One handle to every collaborator a checkout needs.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub settings: Arc<dyn Settings>,
    pub transactions: Arc<dyn TransactionLog>,
    pub expenses: Arc<dyn ExpenseLedger>,
    pub tips: Arc<dyn TipLedger>,
    /// Optional: without it, tip shares are not checked against staff.
    pub staff: Option<Arc<dyn StaffDirectory>>,
}
