//! # Transaction Repository
//!
//! Committed sales.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert()          status = completed   (PRIMARY KEY rejects reused id)│
//! │     │                                                                   │
//! │     ├── delete()   checkout failed after the insert: row is taken back │
//! │     │                                                                   │
//! │     └── mark_refunded()   status = refunded, refunded_at, reason       │
//! │                           (only from completed)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sold lines are stored as one JSON column: they are a frozen snapshot and
//! are never queried line by line.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use micropos_checkout::{RepositoryResult, TransactionLog};
use micropos_core::{CartLine, DiscountSpec, Money, PaymentMethod, Transaction, TransactionStatus};

use super::{from_json, to_json};
use crate::error::{DbError, DbResult};

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, store_id, cashier_id, items, subtotal, tax, discount_amount,
        discount_details, total, timestamp, payment_method, status,
        commission_total, staff_id, refunded_at, refund_reason
    FROM transactions
"#;

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    store_id: String,
    cashier_id: String,
    items: String,
    subtotal: f64,
    tax: f64,
    discount_amount: f64,
    discount_details: Option<String>,
    total: f64,
    timestamp: DateTime<Utc>,
    payment_method: PaymentMethod,
    status: TransactionStatus,
    commission_total: f64,
    staff_id: Option<String>,
    refunded_at: Option<DateTime<Utc>>,
    refund_reason: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        let items: Vec<CartLine> = from_json("items", &row.items)?;
        let discount_details: Option<DiscountSpec> = row
            .discount_details
            .as_deref()
            .map(|raw| from_json("discount_details", raw))
            .transpose()?;

        Ok(Transaction {
            id: row.id,
            store_id: row.store_id,
            cashier_id: row.cashier_id,
            items,
            subtotal: Money::new(row.subtotal),
            tax: Money::new(row.tax),
            discount_amount: Money::new(row.discount_amount),
            discount_details,
            total: Money::new(row.total),
            timestamp: row.timestamp,
            payment_method: row.payment_method,
            status: row.status,
            commission_total: Money::new(row.commission_total),
            staff_id: row.staff_id,
            refunded_at: row.refunded_at,
            refund_reason: row.refund_reason,
        })
    }
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Transaction::try_from).transpose()
    }

    /// Transactions of a store, newest first.
    pub async fn list_by_store(&self, store_id: &str, limit: i64) -> DbResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TRANSACTION} WHERE store_id = ?1 ORDER BY timestamp DESC LIMIT ?2"))
                .bind(store_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Inserts a transaction.
    ///
    /// Fails with `UniqueViolation` naming the id when it is already taken.
    pub async fn insert_transaction(&self, transaction: &Transaction) -> DbResult<()> {
        debug!(tx_id = %transaction.id, store_id = %transaction.store_id, "Inserting transaction");

        let items = to_json("items", &transaction.items)?;
        let discount_details = transaction
            .discount_details
            .as_ref()
            .map(|spec| to_json("discount_details", spec))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                id, store_id, cashier_id, items, subtotal, tax, discount_amount,
                discount_details, total, timestamp, payment_method, status,
                commission_total, staff_id, refunded_at, refund_reason
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.store_id)
        .bind(&transaction.cashier_id)
        .bind(items)
        .bind(transaction.subtotal.amount())
        .bind(transaction.tax.amount())
        .bind(transaction.discount_amount.amount())
        .bind(discount_details)
        .bind(transaction.total.amount())
        .bind(transaction.timestamp)
        .bind(transaction.payment_method)
        .bind(transaction.status)
        .bind(transaction.commission_total.amount())
        .bind(&transaction.staff_id)
        .bind(transaction.refunded_at)
        .bind(&transaction.refund_reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("transactions.id", transaction.id.clone())),
                other => Err(other),
            },
        }
    }

    /// Deletes a transaction. Deleting an unknown id is not an error.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(tx_id = %id, "Deleting transaction");

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Moves a completed transaction to refunded.
    pub async fn refund(&self, id: &str, reason: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = ?1, refunded_at = ?2, refund_reason = ?3
            WHERE id = ?4 AND status = ?5
            "#,
        )
        .bind(TransactionStatus::Refunded)
        .bind(at)
        .bind(reason)
        .bind(id)
        .bind(TransactionStatus::Completed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get_by_id(id).await? {
            None => Err(DbError::not_found("transaction", id)),
            Some(tx) => Err(DbError::InvalidState(format!(
                "transaction {} is {}, only completed transactions can be refunded",
                tx.id, tx.status
            ))),
        }
    }
}

#[async_trait]
impl TransactionLog for TransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> RepositoryResult<()> {
        Ok(self.insert_transaction(transaction).await?)
    }

    async fn remove(&self, transaction_id: &str) -> RepositoryResult<()> {
        Ok(self.delete(transaction_id).await?)
    }

    async fn get(&self, transaction_id: &str) -> RepositoryResult<Option<Transaction>> {
        Ok(self.get_by_id(transaction_id).await?)
    }

    async fn mark_refunded(
        &self,
        transaction_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        Ok(self.refund(transaction_id, reason, at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use micropos_checkout::RepositoryError;
    use micropos_core::{CatalogItem, ItemType, Stock};

    fn sale(id: &str) -> Transaction {
        let line = CartLine::new(
            CatalogItem::new("cola", ItemType::Product, Money::new(100.0)).with_stock(Stock::Tracked(5)),
            2,
        );
        Transaction {
            id: id.to_string(),
            store_id: "store-1".to_string(),
            cashier_id: "cashier-1".to_string(),
            items: vec![line],
            subtotal: Money::new(200.0),
            tax: Money::new(21.6),
            discount_amount: Money::new(20.0),
            discount_details: Some(DiscountSpec::percent(10.0).named("Senior")),
            total: Money::new(201.6),
            timestamp: Utc::now(),
            payment_method: PaymentMethod::Card,
            status: TransactionStatus::Completed,
            commission_total: Money::zero(),
            staff_id: Some("s1".to_string()),
            refunded_at: None,
            refund_reason: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = memory_db().await;
        let repo = db.transactions();

        let tx = sale("TX-1");
        repo.insert(&tx).await.unwrap();

        let loaded = repo.get("TX-1").await.unwrap().unwrap();
        assert_eq!(loaded, tx);
        assert!(repo.get("TX-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_reported() {
        let db = memory_db().await;
        let repo = db.transactions();

        repo.insert(&sale("TX-1")).await.unwrap();
        let err = repo.insert(&sale("TX-1")).await.unwrap_err();
        match err {
            RepositoryError::Duplicate { entity, id } => {
                assert_eq!(entity, "transaction");
                assert_eq!(id, "TX-1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_and_refund() {
        let db = memory_db().await;
        let repo = db.transactions();
        repo.insert(&sale("TX-1")).await.unwrap();
        repo.insert(&sale("TX-2")).await.unwrap();

        repo.remove("TX-2").await.unwrap();
        repo.remove("TX-2").await.unwrap();
        assert!(repo.get("TX-2").await.unwrap().is_none());

        let at = Utc::now();
        repo.mark_refunded("TX-1", "wrong order", at).await.unwrap();
        let refunded = repo.get("TX-1").await.unwrap().unwrap();
        assert_eq!(refunded.status, TransactionStatus::Refunded);
        assert_eq!(refunded.refunded_at, Some(at));
        assert_eq!(refunded.refund_reason.as_deref(), Some("wrong order"));

        let err = repo.mark_refunded("TX-1", "again", at).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));

        let err = repo.mark_refunded("TX-9", "ghost", at).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "transaction", .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = memory_db().await;
        let repo = db.transactions();

        let mut older = sale("TX-old");
        older.timestamp = Utc::now() - chrono::Duration::minutes(5);
        repo.insert(&older).await.unwrap();
        repo.insert(&sale("TX-new")).await.unwrap();

        let listed = repo.list_by_store("store-1", 10).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TX-new", "TX-old"]);
        assert!(repo.list_by_store("store-2", 10).await.unwrap().is_empty());
    }
}
