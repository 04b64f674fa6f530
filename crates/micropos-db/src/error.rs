//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RepositoryError (micropos-checkout) ← What the checkout reacts to     │
//! │       │                                                                 │
//! │       ├── Duplicate   → retry with a fresh transaction id              │
//! │       ├── NotFound    → refund of an unknown sale                      │
//! │       └── Unavailable → compensate and report                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use micropos_checkout::RepositoryError;
use micropos_core::ValidationError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Stock delta for an item id that doesn't exist
    /// - Refund of an unknown transaction
    /// - Voiding an expense that was never written
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Transaction id collision
    /// - Commission expense already posted for a sale
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Tip share for a tip row that doesn't exist
    /// - Store assignment for unknown staff
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A JSON column could not be read or written.
    ///
    /// ## When This Occurs
    /// - `bundle_items` edited by hand into invalid JSON
    /// - Sold lines written by an incompatible version
    #[error("Corrupt {column} column: {message}")]
    CorruptColumn { column: &'static str, message: String },

    /// A record was rejected before it reached SQLite.
    ///
    /// ## When This Occurs
    /// - Catalog item with an empty name, a negative price or a bad SKU
    /// - Store tax rate outside 0-100%
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    /// The row exists but is not in a state that allows the update.
    ///
    /// ## When This Occurs
    /// - Refunding a transaction that is already refunded
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(column: &'static str, err: serde_json::Error) -> Self {
        DbError::CorruptColumn {
            column,
            message: err.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // PRIMARY KEY collisions report the same way
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// What the checkout pipeline sees.
///
/// ```text
/// UniqueViolation → Duplicate    (the caller may retry with a new id)
/// NotFound        → NotFound
/// everything else → Unavailable  (the caller compensates)
/// ```
impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } => RepositoryError::Duplicate {
                entity: entity_for_field(&field),
                id: value,
            },
            DbError::NotFound { entity, id } => RepositoryError::NotFound {
                entity: entity_for_field(&entity),
                id,
            },
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

/// Maps a table name (or `table.column`) onto the entity name used in
/// repository errors.
fn entity_for_field(field: &str) -> &'static str {
    let table = field.split('.').next().unwrap_or(field);
    match table {
        "transactions" | "transaction" => "transaction",
        "expenses" | "expense" => "expense",
        "tips" | "tip_shares" | "tip" => "tip",
        "catalog_items" | "catalog item" => "catalog item",
        "staff" | "staff_stores" => "staff",
        _ => "record",
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
