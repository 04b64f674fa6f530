//! # Checkout Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RepositoryError   a collaborator (catalog, ledger, log) failed        │
//! │        │                                                                │
//! │        ├──────────► CheckoutError   the sale was NOT committed          │
//! │        │            (cart left intact, nothing partially visible)       │
//! │        │                                                                │
//! │        └──────────► TipError        the tip was not recorded            │
//! │                     (the sale, if any, stays committed)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use micropos_core::CoreError;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An entity with this id already exists.
    ///
    /// ## When This Occurs
    /// - Two transactions generated the same id
    /// - A commission expense was already posted for a transaction
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// The backing store could not be reached or rejected the write.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn duplicate(entity: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::Duplicate {
            entity,
            id: id.into(),
        }
    }
}

/// Convenience alias used by every collaborator trait.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Why a checkout (or refund) did not go through.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Business rule violation, raised before any write.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A collaborator failed; any partial writes were compensated.
    #[error("Checkout failed: {0}")]
    Repository(#[from] RepositoryError),

    /// Every generated transaction id collided with an existing one.
    #[error("Could not allocate a unique transaction id after {attempts} attempts")]
    IdExhausted { attempts: u32 },
}

/// Why a tip could not be recorded, settled or listed.
#[derive(Debug, Error)]
pub enum TipError {
    /// Shares do not add up, or the request is malformed.
    #[error(transparent)]
    Allocation(#[from] CoreError),

    /// A share names someone who is not active staff at this store.
    #[error("Staff {staff_id} is not active at store {store_id}")]
    UnknownStaff { staff_id: String, store_id: String },

    #[error("Tip ledger error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use micropos_core::Money;

    #[test]
    fn test_error_messages() {
        let err = CheckoutError::from(RepositoryError::Unavailable("disk full".to_string()));
        assert_eq!(err.to_string(), "Checkout failed: Storage unavailable: disk full");

        let err = CheckoutError::from(CoreError::EmptyCart);
        assert_eq!(err.to_string(), "Cart is empty");

        let err = TipError::from(CoreError::AllocationMismatch {
            allocated: Money::new(90.0),
            total_tip: Money::new(150.0),
        });
        assert_eq!(err.to_string(), "Tip allocations total 90.00 but the tip is 150.00");
    }
}
