//! # Settings Repository
//!
//! Per-store settings. A store with no row yet gets the default tax rate.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use micropos_checkout::{RepositoryResult, Settings};
use micropos_core::validation::validate_tax_rate_percent;
use micropos_core::{TaxRate, DEFAULT_TAX_RATE_PERCENT};

use crate::error::DbResult;

/// One row of `store_settings`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoreSettings {
    pub store_id: String,
    pub store_name: String,
    /// Percent.
    pub tax_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, store_id: &str) -> DbResult<Option<StoreSettings>> {
        let row = sqlx::query_as::<_, StoreSettings>(
            "SELECT store_id, store_name, tax_rate FROM store_settings WHERE store_id = ?1",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, settings: &StoreSettings) -> DbResult<()> {
        debug!(store_id = %settings.store_id, tax_rate = settings.tax_rate, "Saving store settings");
        validate_tax_rate_percent(settings.tax_rate)?;

        sqlx::query(
            r#"
            INSERT INTO store_settings (store_id, store_name, tax_rate)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(store_id) DO UPDATE SET
                store_name = excluded.store_name,
                tax_rate = excluded.tax_rate,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
        )
        .bind(&settings.store_id)
        .bind(&settings.store_name)
        .bind(settings.tax_rate)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Settings for SettingsRepository {
    async fn tax_rate_percent(&self, store_id: &str) -> RepositoryResult<TaxRate> {
        let percent = self
            .get(store_id)
            .await?
            .map_or(DEFAULT_TAX_RATE_PERCENT, |settings| settings.tax_rate);
        Ok(TaxRate::from_percent(percent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::memory_db;

    #[tokio::test]
    async fn test_tax_rate_defaults_then_follows_settings() {
        let db = memory_db().await;
        let repo = db.settings();

        let rate = repo.tax_rate_percent("store-1").await.unwrap();
        assert_eq!(rate, TaxRate::from_percent(DEFAULT_TAX_RATE_PERCENT));

        let mut settings = StoreSettings {
            store_id: "store-1".to_string(),
            store_name: "Lola's Salon".to_string(),
            tax_rate: 5.0,
        };
        repo.upsert(&settings).await.unwrap();
        assert_eq!(repo.tax_rate_percent("store-1").await.unwrap(), TaxRate::from_percent(5.0));

        assert_eq!(repo.get("store-1").await.unwrap().unwrap().store_name, "Lola's Salon");
    }

    #[tokio::test]
    async fn test_out_of_range_tax_rate_rejected() {
        let db = memory_db().await;
        let repo = db.settings();

        let mut settings = StoreSettings {
            store_id: "store-1".to_string(),
            store_name: "Lola's Salon".to_string(),
            tax_rate: 5.0,
        };
        repo.upsert(&settings).await.unwrap();

        for bad in [-3.0, 120.0, f64::NAN] {
            settings.tax_rate = bad;
            let err = repo.upsert(&settings).await.unwrap_err();
            assert!(matches!(err, DbError::Validation(_)));
        }
        assert_eq!(repo.tax_rate_percent("store-1").await.unwrap(), TaxRate::from_percent(5.0));
    }
}
