//! # Error Types
//!
//! Domain-specific error types for micropos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  micropos-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  micropos-checkout errors                                              │
//! │  ├── RepositoryError  - Collaborator (catalog, ledger) failures        │
//! │  ├── CheckoutError    - What a failed checkout reports                 │
//! │  └── TipError         - What a failed tip recording reports            │
//! │                                                                         │
//! │  micropos-db errors                                                    │
//! │  └── DbError          - SQLite failures, mapped to RepositoryError     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → Operator          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numeric Guards Are Not Errors
//! A negative discount value or a commissionable item without a rate comes
//! from admin-entered data, not from the cashier. Those normalize to 0 in
//! the calculators and never surface here.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Raised synchronously before any mutation. The caller presents them to the
/// operator and takes no further action until the input changes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was attempted on a cart with no lines.
    ///
    /// This is a guard, not a recoverable condition: the UI only offers
    /// checkout once the cart is populated.
    #[error("Cart is empty")]
    EmptyCart,

    /// Tip shares do not add up to the tip total.
    ///
    /// ## User Workflow
    /// ```text
    /// Tip: 150.00
    /// Shares: Ana 90.00 + (nobody else)
    ///      │
    ///      ▼
    /// AllocationMismatch { allocated: 90.00, total_tip: 150.00 }
    ///      │
    ///      ▼
    /// UI shows: "Allocated 90.00 / 150.00"
    /// ```
    #[error("Tip allocations total {allocated} but the tip is {total_tip}")]
    AllocationMismatch { allocated: Money, total_tip: Money },

    /// Cash handed over does not cover the sale total.
    ///
    /// ## When This Occurs
    /// - The cashier keyed in a tender below the total
    /// - The tender is not a number
    #[error("Cash tendered {tendered} does not cover the total {total}")]
    InsufficientTender { tendered: Money, total: Money },

    /// Not enough stock to add the requested quantity to the cart.
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// Item is not in the cart.
    #[error("Item {0} is not in the cart")]
    NotInCart(String),

    /// Item does not exist in the catalog (or is disabled).
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Transaction is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Refunding a transaction that was already refunded
    #[error("Transaction {transaction_id} is {current_status}, cannot perform operation")]
    InvalidTransactionStatus {
        transaction_id: String,
        current_status: String,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format or combination of fields.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: "shampoo".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for shampoo: available 3, requested 5"
        );

        let err = CoreError::AllocationMismatch {
            allocated: Money::new(90.0),
            total_tip: Money::new(150.0),
        };
        assert_eq!(
            err.to_string(),
            "Tip allocations total 90.00 but the tip is 150.00"
        );

        let err = CoreError::InsufficientTender {
            tendered: Money::new(100.0),
            total: Money::new(112.0),
        };
        assert_eq!(err.to_string(), "Cash tendered 100.00 does not cover the total 112.00");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("id");
        assert_eq!(err.to_string(), "id is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: 999.0,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("sku").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
