//! # micropos-db: SQLite Collaborators for MicroPOS
//!
//! Every collaborator the checkout pipeline talks to, backed by one SQLite
//! file through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MicroPOS Data Flow                               │
//! │                                                                         │
//! │  CheckoutService::finalize_checkout                                    │
//! │       │  Arc<dyn Catalog>, Arc<dyn TransactionLog>, ...                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   micropos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo     │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo │   │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ ExpenseRepo     │   │   _schema    │  │   │
//! │  │   │               │    │ TipRepo, ...    │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (micropos.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and their mapping to `RepositoryError`
//! - [`repository`] - One repository per collaborator trait
//!
//! ## Usage
//!
//! ```rust,ignore
//! use micropos_checkout::{CheckoutConfig, CheckoutService};
//! use micropos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./micropos.db")).await?;
//! let service = CheckoutService::new(db.collaborators(), CheckoutConfig::from_env());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::CatalogRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::settings::{SettingsRepository, StoreSettings};
pub use repository::staff::StaffRepository;
pub use repository::tip::TipRepository;
pub use repository::transaction::TransactionRepository;
