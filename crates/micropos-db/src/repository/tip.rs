//! # Tip Repository
//!
//! Tips and their per-staff shares.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tips                              tip_shares                           │
//! │  ┌──────────────────────────┐      ┌──────────────────────────────┐    │
//! │  │ id            PK         │◄─────│ tip_id   (ON DELETE CASCADE) │    │
//! │  │ store_id, sale_id        │  1:N │ position (keeps share order) │    │
//! │  │ total_tip, method        │      │ staff_id                     │    │
//! │  │ status, created_at,      │      │ amount                       │    │
//! │  │ settled_at               │      └──────────────────────────────┘    │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A tip and its shares are written in one SQL transaction: a tip is never
//! visible without its split.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use micropos_checkout::{RepositoryResult, TipFilter, TipLedger};
use micropos_core::{Money, TipMethod, TipRecord, TipShare, TipStatus};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct TipRow {
    id: String,
    store_id: String,
    sale_id: String,
    total_tip: f64,
    method: TipMethod,
    status: TipStatus,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TipRow {
    fn into_record(self, shares: Vec<TipShare>) -> TipRecord {
        TipRecord {
            id: self.id,
            store_id: self.store_id,
            sale_id: self.sale_id,
            total_tip: Money::new(self.total_tip),
            method: self.method,
            status: self.status,
            shares,
            created_at: self.created_at,
            settled_at: self.settled_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ShareRow {
    tip_id: String,
    staff_id: String,
    amount: f64,
}

#[derive(Debug, Clone)]
pub struct TipRepository {
    pool: SqlitePool,
}

impl TipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TipRepository { pool }
    }

    /// Inserts a tip and its shares atomically.
    pub async fn insert(&self, tip: &TipRecord) -> DbResult<()> {
        debug!(tip_id = %tip.id, sale_id = %tip.sale_id, shares = tip.shares.len(), "Inserting tip");

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO tips (id, store_id, sale_id, total_tip, method, status, created_at, settled_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&tip.id)
        .bind(&tip.store_id)
        .bind(&tip.sale_id)
        .bind(tip.total_tip.amount())
        .bind(tip.method)
        .bind(tip.status)
        .bind(tip.created_at)
        .bind(tip.settled_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            return Err(match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("tips.id", tip.id.clone()),
                other => other,
            });
        }

        for (position, share) in tip.shares.iter().enumerate() {
            sqlx::query("INSERT INTO tip_shares (tip_id, position, staff_id, amount) VALUES (?1, ?2, ?3, ?4)")
                .bind(&tip.id)
                .bind(position as i64)
                .bind(&share.staff_id)
                .bind(share.amount.amount())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Marks the listed unsettled tips of a store settled.
    pub async fn settle_many(&self, store_id: &str, ids: &[String], at: DateTime<Utc>) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tips SET status = ");
        builder
            .push_bind(TipStatus::Settled)
            .push(", settled_at = ")
            .push_bind(at)
            .push(" WHERE store_id = ")
            .push_bind(store_id)
            .push(" AND status = ")
            .push_bind(TipStatus::Unsettled)
            .push(" AND id IN (");
        {
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");
        }

        let result = builder.build().execute(&self.pool).await?;
        debug!(store_id = %store_id, settled = result.rows_affected(), "Settled tips");
        Ok(result.rows_affected() as usize)
    }

    /// Tips matching `filter`, newest first, with their shares.
    pub async fn find(&self, filter: &TipFilter) -> DbResult<Vec<TipRecord>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, store_id, sale_id, total_tip, method, status, created_at, settled_at FROM tips WHERE store_id = ",
        );
        builder.push_bind(&filter.store_id);

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(staff_id) = &filter.staff_id {
            builder
                .push(" AND EXISTS (SELECT 1 FROM tip_shares s WHERE s.tip_id = tips.id AND s.staff_id = ")
                .push_bind(staff_id)
                .push(")");
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
        builder.push(" ORDER BY created_at DESC");

        let rows: Vec<TipRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut shares: HashMap<String, Vec<TipShare>> = HashMap::new();
        for share in self.shares_for(rows.iter().map(|row| row.id.as_str())).await? {
            shares
                .entry(share.tip_id)
                .or_default()
                .push(TipShare::new(share.staff_id, Money::new(share.amount)));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let split = shares.remove(&row.id).unwrap_or_default();
                row.into_record(split)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TipRecord>> {
        let row: Option<TipRow> = sqlx::query_as(
            "SELECT id, store_id, sale_id, total_tip, method, status, created_at, settled_at FROM tips WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let split = self
            .shares_for(std::iter::once(id))
            .await?
            .into_iter()
            .map(|s| TipShare::new(s.staff_id, Money::new(s.amount)))
            .collect();
        Ok(Some(row.into_record(split)))
    }

    /// Shares of the given tips, in recorded order per tip.
    async fn shares_for<'a>(&self, tip_ids: impl Iterator<Item = &'a str>) -> DbResult<Vec<ShareRow>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT tip_id, staff_id, amount FROM tip_shares WHERE tip_id IN (");
        {
            let mut separated = builder.separated(", ");
            for id in tip_ids {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(")");
        }
        builder.push(" ORDER BY tip_id, position");

        Ok(builder.build_query_as().fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl TipLedger for TipRepository {
    async fn record(&self, tip: TipRecord) -> RepositoryResult<TipRecord> {
        self.insert(&tip).await?;
        Ok(tip)
    }

    async fn settle(&self, store_id: &str, tip_ids: &[String], at: DateTime<Utc>) -> RepositoryResult<usize> {
        Ok(self.settle_many(store_id, tip_ids, at).await?)
    }

    async fn list(&self, filter: &TipFilter) -> RepositoryResult<Vec<TipRecord>> {
        Ok(self.find(filter).await?)
    }
}
