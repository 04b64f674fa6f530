//! # Repository Module
//!
//! One SQLite repository per checkout collaborator.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutService                                                        │
//! │       │                                                                 │
//! │       │  Arc<dyn Catalog>::apply_stock_delta("flour", -2)              │
//! │       ▼                                                                 │
//! │  CatalogRepository                                                     │
//! │  ├── inherent methods   DbResult<T>    (seed, admin, tests)            │
//! │  └── trait impl         RepositoryResult<T>  (DbError → Repository..)  │
//! │       │                                                                 │
//! │       │  UPDATE catalog_items SET stock = stock + ?                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Items, relative stock updates
//! - [`SettingsRepository`](settings::SettingsRepository) - Per-store tax rate
//! - [`StaffRepository`](staff::StaffRepository) - Staff and store assignments
//! - [`TransactionRepository`](transaction::TransactionRepository) - Committed sales
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Commission and other expenses
//! - [`TipRepository`](tip::TipRepository) - Tips and their shares

pub mod catalog;
pub mod expense;
pub mod settings;
pub mod staff;
pub mod tip;
pub mod transaction;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};

/// Serializes a value for a JSON text column.
pub(crate) fn to_json<T: Serialize + ?Sized>(column: &'static str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::corrupt(column, e))
}

/// Reads a JSON text column.
pub(crate) fn from_json<T: DeserializeOwned>(column: &'static str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::corrupt(column, e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::pool::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
