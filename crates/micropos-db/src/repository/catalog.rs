//! # Catalog Repository
//!
//! Catalog items and their stock counters.
//!
//! ## Stock Column
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock = NULL   → not tracked (services, made-to-order items)          │
//! │  stock = 12     → tracked; may go negative after a concurrent sale     │
//! │                                                                         │
//! │  Updates are always relative:                                          │
//! │    UPDATE catalog_items SET stock = stock + ?delta WHERE id = ?        │
//! │  NULL + delta stays NULL, so untracked items are never turned into     │
//! │  tracked ones by a sale.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use micropos_checkout::{Catalog, RepositoryResult};
use micropos_core::stock::{is_low_stock, DEFAULT_LOW_STOCK_THRESHOLD};
use micropos_core::validation::validate_catalog_item;
use micropos_core::{CatalogItem, ComponentRef, ItemType, Money, Stock};

use super::{from_json, to_json};
use crate::error::{DbError, DbResult};

const SELECT_ITEM: &str = r#"
    SELECT
        id, store_id, name, sku, price, cost, stock, item_type,
        is_commissionable, commission_rate, bundle_items, consumed_items,
        low_stock_threshold, enabled
    FROM catalog_items
"#;

#[derive(Debug, FromRow)]
struct CatalogRow {
    id: String,
    store_id: String,
    name: String,
    sku: String,
    price: f64,
    cost: f64,
    stock: Option<i64>,
    item_type: String,
    is_commissionable: bool,
    commission_rate: Option<f64>,
    bundle_items: String,
    consumed_items: String,
    low_stock_threshold: Option<i64>,
    enabled: bool,
}

impl TryFrom<CatalogRow> for CatalogItem {
    type Error = DbError;

    fn try_from(row: CatalogRow) -> DbResult<Self> {
        let bundle_items: Vec<ComponentRef> = from_json("bundle_items", &row.bundle_items)?;
        let consumed_items: Vec<ComponentRef> = from_json("consumed_items", &row.consumed_items)?;

        Ok(CatalogItem {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            sku: row.sku,
            price: Money::new(row.price),
            cost: Money::new(row.cost),
            stock: Stock::from_column(row.stock),
            item_type: ItemType::parse_lenient(&row.item_type),
            is_commissionable: row.is_commissionable,
            commission_rate: row.commission_rate,
            bundle_items,
            consumed_items,
            low_stock_threshold: row.low_stock_threshold,
            enabled: row.enabled,
        })
    }
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets an item by ID, enabled or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let row: Option<CatalogRow> = sqlx::query_as(&format!("{SELECT_ITEM} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CatalogItem::try_from).transpose()
    }

    /// Gets several items in one query. Unknown ids are left out.
    pub async fn get_by_ids(&self, ids: &[String]) -> DbResult<Vec<CatalogItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_ITEM);
        builder.push(" WHERE id IN (");
        {
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");
        }

        let rows: Vec<CatalogRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    /// Enabled items of a store, by name.
    pub async fn list_by_store(&self, store_id: &str) -> DbResult<Vec<CatalogItem>> {
        let rows: Vec<CatalogRow> =
            sqlx::query_as(&format!("{SELECT_ITEM} WHERE store_id = ?1 AND enabled = 1 ORDER BY name COLLATE NOCASE"))
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    /// Tracked items at or under their low-stock threshold.
    pub async fn low_stock(&self, store_id: &str) -> DbResult<Vec<CatalogItem>> {
        Ok(self
            .list_by_store(store_id)
            .await?
            .into_iter()
            .filter(|item| is_low_stock(item, DEFAULT_LOW_STOCK_THRESHOLD))
            .collect())
    }

    /// Inserts an item, or replaces every field of an existing one.
    pub async fn upsert(&self, item: &CatalogItem) -> DbResult<()> {
        debug!(id = %item.id, sku = %item.sku, "Upserting catalog item");
        validate_catalog_item(item)?;

        let bundle_items = to_json("bundle_items", &item.bundle_items)?;
        let consumed_items = to_json("consumed_items", &item.consumed_items)?;

        sqlx::query(
            r#"
            INSERT INTO catalog_items (
                id, store_id, name, sku, price, cost, stock, item_type,
                is_commissionable, commission_rate, bundle_items, consumed_items,
                low_stock_threshold, enabled
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                store_id = excluded.store_id,
                name = excluded.name,
                sku = excluded.sku,
                price = excluded.price,
                cost = excluded.cost,
                stock = excluded.stock,
                item_type = excluded.item_type,
                is_commissionable = excluded.is_commissionable,
                commission_rate = excluded.commission_rate,
                bundle_items = excluded.bundle_items,
                consumed_items = excluded.consumed_items,
                low_stock_threshold = excluded.low_stock_threshold,
                enabled = excluded.enabled,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
        )
        .bind(&item.id)
        .bind(&item.store_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.price.amount())
        .bind(item.cost.amount())
        .bind(item.stock.quantity())
        .bind(item.item_type.as_str())
        .bind(item.is_commissionable)
        .bind(item.commission_rate)
        .bind(bundle_items)
        .bind(consumed_items)
        .bind(item.low_stock_threshold)
        .bind(item.enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds `delta` to the item's stock in place.
    ///
    /// Untracked items stay untracked. Fails with `NotFound` when the id is
    /// unknown.
    pub async fn add_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta, "Applying stock delta");

        let result = sqlx::query(
            r#"
            UPDATE catalog_items
            SET stock = stock + ?1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?2
            "#,
        )
        .bind(delta)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("catalog item", id));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for CatalogRepository {
    async fn get(&self, item_id: &str) -> RepositoryResult<Option<CatalogItem>> {
        Ok(self.get_by_id(item_id).await?)
    }

    async fn apply_stock_delta(&self, item_id: &str, delta: i64) -> RepositoryResult<()> {
        Ok(self.add_stock(item_id, delta).await?)
    }

    async fn get_many(&self, item_ids: &[String]) -> RepositoryResult<Vec<CatalogItem>> {
        Ok(self.get_by_ids(item_ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use micropos_checkout::RepositoryError;

    fn burger() -> CatalogItem {
        CatalogItem::new("burger", ItemType::Menu, Money::new(150.0))
            .with_name("Burger Meal")
            .with_store("store-1")
            .with_bundle(vec![ComponentRef::new("bun", 1), ComponentRef::new("patty", 2)])
            .with_consumed(vec![ComponentRef::new("wrapper", 1)])
    }

    #[tokio::test]
    async fn test_upsert_and_get_round_trip() {
        let db = memory_db().await;
        let repo = db.catalog();

        let item = burger();
        repo.upsert(&item).await.unwrap();

        let loaded = repo.get_by_id("burger").await.unwrap().unwrap();
        assert_eq!(loaded, item);
        assert_eq!(loaded.stock, Stock::Untracked);

        assert!(repo.get_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_item_not_written() {
        let db = memory_db().await;
        let repo = db.catalog();

        let negative = CatalogItem::new("cola", ItemType::Product, Money::new(-5.0));
        let nameless = CatalogItem::new("cola", ItemType::Product, Money::new(50.0)).with_name("  ");
        let bundled_product = CatalogItem::new("cola", ItemType::Product, Money::new(50.0))
            .with_bundle(vec![ComponentRef::new("ice", 1)]);
        let self_consuming = CatalogItem::new("cola", ItemType::Product, Money::new(50.0))
            .with_consumed(vec![ComponentRef::new("cola", 1)]);
        let greedy = CatalogItem::new("haircut", ItemType::Service, Money::new(250.0)).with_commission(1.5);

        for item in [negative, nameless, bundled_product, self_consuming, greedy] {
            let err = repo.upsert(&item).await.unwrap_err();
            assert!(matches!(err, DbError::Validation(_)), "{} accepted", item.id);
        }

        assert!(repo.get_by_id("cola").await.unwrap().is_none());
        assert!(repo.get_by_id("haircut").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stock_delta_is_relative() {
        let db = memory_db().await;
        let repo = db.catalog();
        repo.upsert(&CatalogItem::new("patty", ItemType::Ingredient, Money::zero()).with_stock(Stock::Tracked(10)))
            .await
            .unwrap();
        repo.upsert(&burger()).await.unwrap();

        repo.apply_stock_delta("patty", -4).await.unwrap();
        repo.apply_stock_delta("patty", -7).await.unwrap();
        let patty = repo.get_by_id("patty").await.unwrap().unwrap();
        assert_eq!(patty.stock, Stock::Tracked(-1));

        // Untracked stays untracked
        repo.apply_stock_delta("burger", -1).await.unwrap();
        let burger = repo.get_by_id("burger").await.unwrap().unwrap();
        assert_eq!(burger.stock, Stock::Untracked);

        let err = repo.apply_stock_delta("ghost", -1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_many_and_store_listing() {
        let db = memory_db().await;
        let repo = db.catalog();
        repo.upsert(&burger()).await.unwrap();
        repo.upsert(
            &CatalogItem::new("bun", ItemType::Ingredient, Money::zero())
                .with_store("store-1")
                .with_stock(Stock::Tracked(3)),
        )
        .await
        .unwrap();
        let mut hidden = CatalogItem::new("old", ItemType::Product, Money::new(1.0)).with_store("store-1");
        hidden.enabled = false;
        repo.upsert(&hidden).await.unwrap();

        let found = repo
            .get_many(&["bun".to_string(), "ghost".to_string(), "old".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());

        let listed = repo.list_by_store("store-1").await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bun", "burger"]);

        let low = repo.low_stock("store-1").await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "bun");
    }

    #[tokio::test]
    async fn test_corrupt_json_column() {
        let db = memory_db().await;
        let repo = db.catalog();
        repo.upsert(&burger()).await.unwrap();

        sqlx::query("UPDATE catalog_items SET bundle_items = 'not json' WHERE id = 'burger'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_by_id("burger").await.unwrap_err();
        assert!(matches!(err, DbError::CorruptColumn { column: "bundle_items", .. }));
    }
}
