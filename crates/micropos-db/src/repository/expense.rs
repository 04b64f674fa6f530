//! # Expense Repository
//!
//! Operating expenses, including the COMMISSIONS expense a checkout posts
//! for commissionable sales (id `comm-<transaction id>`, so a sale can never
//! book its commission twice).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use micropos_checkout::{ExpenseLedger, RepositoryResult};
use micropos_core::{Expense, ExpenseCategory, Money};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: String,
    store_id: String,
    recorded_by: String,
    description: String,
    amount: f64,
    category: ExpenseCategory,
    date: DateTime<Utc>,
    approved: bool,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            store_id: row.store_id,
            recorded_by: row.recorded_by,
            description: row.description,
            amount: Money::new(row.amount),
            category: row.category,
            date: row.date,
            approved: row.approved,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, amount = %expense.amount, "Inserting expense");

        let result = sqlx::query(
            r#"
            INSERT INTO expenses (
                id, store_id, recorded_by, description, amount,
                category, date, approved, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.store_id)
        .bind(&expense.recorded_by)
        .bind(&expense.description)
        .bind(expense.amount.amount())
        .bind(expense.category)
        .bind(expense.date)
        .bind(expense.approved)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("expenses.id", expense.id.clone())),
                other => Err(other),
            },
        }
    }

    /// Deletes an expense. Fails with `NotFound` when the id is unknown.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("expense", id));
        }
        Ok(())
    }

    /// Expenses of a store, newest first.
    pub async fn list_by_store(&self, store_id: &str) -> DbResult<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(
            r#"
            SELECT id, store_id, recorded_by, description, amount,
                   category, date, approved, created_at
            FROM expenses
            WHERE store_id = ?1
            ORDER BY date DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }
}

#[async_trait]
impl ExpenseLedger for ExpenseRepository {
    async fn create(&self, expense: Expense) -> RepositoryResult<Expense> {
        self.insert(&expense).await?;
        Ok(expense)
    }

    async fn void(&self, expense_id: &str) -> RepositoryResult<()> {
        Ok(self.delete(expense_id).await?)
    }

    async fn list(&self, store_id: &str) -> RepositoryResult<Vec<Expense>> {
        Ok(self.list_by_store(store_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use micropos_checkout::RepositoryError;

    fn commission(tx_id: &str) -> Expense {
        let now = Utc::now();
        Expense {
            id: Expense::commission_id(tx_id),
            store_id: "store-1".to_string(),
            recorded_by: "system_auto".to_string(),
            description: format!("Auto: Commissions for transaction {tx_id}"),
            amount: Money::new(10.0),
            category: ExpenseCategory::Commissions,
            date: now,
            approved: true,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_list_void() {
        let db = memory_db().await;
        let repo = db.expenses();

        let created = repo.create(commission("TX-1")).await.unwrap();
        assert_eq!(created.id, "comm-TX-1");

        let listed = repo.list("store-1").await.unwrap();
        assert_eq!(listed, vec![created]);
        assert!(repo.list("store-2").await.unwrap().is_empty());

        repo.void("comm-TX-1").await.unwrap();
        assert!(repo.list("store-1").await.unwrap().is_empty());

        let err = repo.void("comm-TX-1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "expense", .. }));
    }

    #[tokio::test]
    async fn test_commission_posted_once_per_sale() {
        let db = memory_db().await;
        let repo = db.expenses();

        repo.create(commission("TX-1")).await.unwrap();
        let err = repo.create(commission("TX-1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate { entity: "expense", .. }));
    }

    #[tokio::test]
    async fn test_category_stored_as_text() {
        let db = memory_db().await;
        db.expenses().create(commission("TX-1")).await.unwrap();

        let category: String = sqlx::query_scalar("SELECT category FROM expenses WHERE id = 'comm-TX-1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(category, "COMMISSIONS");
    }
}
