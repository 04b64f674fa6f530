//! # Tip Allocation Recorder
//!
//! Records, settles and lists tips. Runs after a sale has committed and
//! never touches the sale itself: a tip that fails to record is reported
//! on its own and the sale stays.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use micropos_core::tips::validate_allocations;
use micropos_core::{TipInput, TipRecord};

use crate::collaborators::{StaffDirectory, TipFilter, TipLedger};
use crate::error::TipError;

#[derive(Clone)]
pub struct TipAllocationRecorder {
    ledger: Arc<dyn TipLedger>,
    staff: Option<Arc<dyn StaffDirectory>>,
}

impl TipAllocationRecorder {
    pub fn new(ledger: Arc<dyn TipLedger>, staff: Option<Arc<dyn StaffDirectory>>) -> Self {
        TipAllocationRecorder { ledger, staff }
    }

    /// Validates and records a tip as unsettled.
    ///
    /// ## Checks (nothing is written if any fails)
    /// 1. Shares add up to the tip, to the cent
    /// 2. With a staff directory wired: every share goes to active staff of
    ///    the store
    pub async fn record(&self, input: TipInput) -> Result<TipRecord, TipError> {
        validate_allocations(&input)?;

        if let Some(directory) = &self.staff {
            let members = directory.list(&[input.store_id.clone()]).await?;
            for share in &input.allocations {
                let known = members
                    .iter()
                    .any(|m| m.id == share.staff_id && m.works_at(&input.store_id));
                if !known {
                    return Err(TipError::UnknownStaff {
                        staff_id: share.staff_id.clone(),
                        store_id: input.store_id.clone(),
                    });
                }
            }
        }

        let record = TipRecord::from_input(input, Utc::now());
        debug!(tip_id = %record.id, sale_id = %record.sale_id, shares = record.shares.len(), "Recording tip");

        let record = self.ledger.record(record).await?;
        info!(tip_id = %record.id, total = %record.total_tip, "Tip recorded");
        Ok(record)
    }

    /// Settles the given tips of a store. Returns how many changed.
    pub async fn settle(&self, store_id: &str, tip_ids: &[String]) -> Result<usize, TipError> {
        if tip_ids.is_empty() {
            return Ok(0);
        }

        let settled = self.ledger.settle(store_id, tip_ids, Utc::now()).await?;
        info!(store_id = %store_id, requested = tip_ids.len(), settled, "Tips settled");
        Ok(settled)
    }

    /// Tips matching `filter`, newest first.
    pub async fn list(&self, filter: &TipFilter) -> Result<Vec<TipRecord>, TipError> {
        Ok(self.ledger.list(filter).await?)
    }
}
