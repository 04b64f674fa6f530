//! # Tip Allocation
//!
//! Rules for splitting a tip across staff.
//!
//! ## Allocation Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_tip = 150.00                                                     │
//! │                                                                         │
//! │  shares: Ana 90.00 + Ben 60.00 = 150.00   ✅ recorded                   │
//! │  shares: Ana 90.00               =  90.00   ❌ AllocationMismatch        │
//! │  shares: (none)                             ✅ recorded, unallocated     │
//! │                                                                         │
//! │  shares: Ana 149.996             ≈ 150.00   ❌ fraction of a cent        │
//! │                                                                         │
//! │  Compared in whole cents: 0.10 + 0.20 equals 0.30 here, even though    │
//! │  it does not in binary floating point.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{TipInput, TipRecord, TipShare, TipStatus};

/// Sum of all shares.
pub fn allocated_total(shares: &[TipShare]) -> Money {
    shares.iter().map(|share| share.amount).sum()
}

/// Checks a tip request before anything is written.
///
/// ## Rules
/// - `store_id` and `sale_id` are required
/// - `total_tip` must be positive
/// - every share needs a staff id and a non-negative amount
/// - the tip and every share are whole cents
/// - non-empty shares must add up to `total_tip` to the cent
pub fn validate_allocations(input: &TipInput) -> CoreResult<()> {
    if input.store_id.trim().is_empty() {
        return Err(ValidationError::required("store_id").into());
    }
    if input.sale_id.trim().is_empty() {
        return Err(ValidationError::required("sale_id").into());
    }

    if !input.total_tip.is_finite() || !input.total_tip.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "total_tip".to_string(),
        }
        .into());
    }
    if !input.total_tip.is_whole_cents() {
        return Err(ValidationError::invalid("total_tip", "must be a whole number of cents").into());
    }

    for share in &input.allocations {
        if share.staff_id.trim().is_empty() {
            return Err(ValidationError::required("staff_id").into());
        }
        if !share.amount.is_finite() || share.amount.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: format!("share for {}", share.staff_id),
            }
            .into());
        }
        if !share.amount.is_whole_cents() {
            return Err(ValidationError::invalid(
                &format!("share for {}", share.staff_id),
                "must be a whole number of cents",
            )
            .into());
        }
    }

    if input.allocations.is_empty() {
        return Ok(());
    }

    let allocated = allocated_total(&input.allocations);
    let allocated_cents: i64 = input.allocations.iter().map(|share| share.amount.to_cents()).sum();
    if allocated_cents != input.total_tip.to_cents() {
        return Err(CoreError::AllocationMismatch {
            allocated,
            total_tip: input.total_tip,
        });
    }

    Ok(())
}

/// Splits a tip evenly in whole cents.
///
/// Leftover cents go one at a time to the first staff members, so the
/// shares always add up to the total exactly.
///
/// ```rust
/// use micropos_core::tips::split_evenly;
/// use micropos_core::Money;
///
/// let staff = vec!["ana".to_string(), "ben".to_string(), "cy".to_string()];
/// let shares = split_evenly(Money::new(100.0), &staff);
///
/// assert_eq!(shares[0].amount.to_cents(), 3334);
/// assert_eq!(shares[1].amount.to_cents(), 3333);
/// assert_eq!(shares[2].amount.to_cents(), 3333);
/// ```
pub fn split_evenly(total: Money, staff_ids: &[String]) -> Vec<TipShare> {
    if staff_ids.is_empty() {
        return Vec::new();
    }

    let total_cents = total.to_cents().max(0);
    let count = staff_ids.len() as i64;
    let base = total_cents / count;
    let remainder = total_cents % count;

    staff_ids
        .iter()
        .enumerate()
        .map(|(i, staff_id)| {
            let extra = if (i as i64) < remainder { 1 } else { 0 };
            TipShare::new(staff_id.clone(), Money::from_cents(base + extra))
        })
        .collect()
}

impl TipRecord {
    /// Builds an unsettled record from a validated request.
    pub fn from_input(input: TipInput, now: DateTime<Utc>) -> TipRecord {
        TipRecord {
            id: Uuid::new_v4().to_string(),
            store_id: input.store_id,
            sale_id: input.sale_id,
            total_tip: input.total_tip,
            method: input.method,
            status: TipStatus::Unsettled,
            shares: input.allocations,
            created_at: now,
            settled_at: None,
        }
    }

    /// Marks the tip settled. Returns false if it already was.
    pub fn settle(&mut self, at: DateTime<Utc>) -> bool {
        if self.status == TipStatus::Settled {
            return false;
        }
        self.status = TipStatus::Settled;
        self.settled_at = Some(at);
        true
    }

    /// Amount allocated to `staff_id`, zero if they have no share.
    pub fn share_for(&self, staff_id: &str) -> Money {
        self.shares
            .iter()
            .filter(|share| share.staff_id == staff_id)
            .map(|share| share.amount)
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
