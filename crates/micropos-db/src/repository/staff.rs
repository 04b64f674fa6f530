//! # Staff Repository
//!
//! Staff members and the stores they work at. Used to check that tip shares
//! go to active staff of the store.

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use micropos_checkout::{RepositoryResult, StaffDirectory};
use micropos_core::{Staff, StaffRole};

use super::from_json;
use crate::error::{DbError, DbResult};

const SELECT_STAFF: &str = r#"
    SELECT
        s.id, s.name, s.role, s.is_active,
        (SELECT json_group_array(a.store_id) FROM staff_stores a WHERE a.staff_id = s.id) AS store_ids
    FROM staff s
"#;

#[derive(Debug, FromRow)]
struct StaffRow {
    id: String,
    name: String,
    role: String,
    is_active: bool,
    store_ids: String,
}

impl TryFrom<StaffRow> for Staff {
    type Error = DbError;

    fn try_from(row: StaffRow) -> DbResult<Self> {
        let mut store_ids: Vec<String> = from_json("store_ids", &row.store_ids)?;
        store_ids.sort();

        Ok(Staff {
            id: row.id,
            name: row.name,
            role: StaffRole::parse_lenient(&row.role),
            store_ids,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let row: Option<StaffRow> = sqlx::query_as(&format!("{SELECT_STAFF} WHERE s.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Staff::try_from).transpose()
    }

    /// Staff assigned to any of `store_ids`, active or not, by name.
    pub async fn list_for_stores(&self, store_ids: &[String]) -> DbResult<Vec<Staff>> {
        if store_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_STAFF);
        builder.push(
            " WHERE EXISTS (SELECT 1 FROM staff_stores m WHERE m.staff_id = s.id AND m.store_id IN (",
        );
        {
            let mut separated = builder.separated(", ");
            for store_id in store_ids {
                separated.push_bind(store_id);
            }
            separated.push_unseparated("))");
        }
        builder.push(" ORDER BY s.name COLLATE NOCASE");

        let rows: Vec<StaffRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Staff::try_from).collect()
    }

    /// Inserts or replaces a staff member together with their store list.
    pub async fn upsert(&self, staff: &Staff) -> DbResult<()> {
        debug!(id = %staff.id, stores = staff.store_ids.len(), "Saving staff member");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, role, is_active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                is_active = excluded.is_active
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(staff.role.as_str())
        .bind(staff.is_active)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM staff_stores WHERE staff_id = ?1")
            .bind(&staff.id)
            .execute(&mut *tx)
            .await?;

        for store_id in &staff.store_ids {
            sqlx::query("INSERT OR IGNORE INTO staff_stores (staff_id, store_id) VALUES (?1, ?2)")
                .bind(&staff.id)
                .bind(store_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl StaffDirectory for StaffRepository {
    async fn list(&self, store_ids: &[String]) -> RepositoryResult<Vec<Staff>> {
        Ok(self.list_for_stores(store_ids).await?)
    }
}
