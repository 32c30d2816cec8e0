use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::BatchError;
use crate::handle::Handle;
use crate::FIRST_BATCH_ID;

// ============================================
// STATE
// ============================================

/// All batches plus the current batch pointer.
/// Records are never removed; exited deposits are zeroed in place.
#[account]
#[derive(Debug)]
pub struct BatchBook {
    pub current_batch_id: u64,
    pub batches: BTreeMap<u64, BatchRecord>,
    /// Dispatched unwrap handle -> batch id, for the settle callback
    pub unwrap_index: BTreeMap<Handle, u64>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchRecord {
    pub total_deposits: Option<Handle>,
    pub deposits: BTreeMap<Pubkey, Handle>,
    pub unwrap_amount: Option<Handle>,
    pub exchange_rate: Option<u128>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    /// Accepting joins
    Open,
    /// Unwrap requested, waiting for the oracle
    Dispatched,
    /// Rate fixed, exits allowed
    Finalized,
}

impl Default for BatchBook {
    fn default() -> Self {
        Self {
            current_batch_id: FIRST_BATCH_ID,
            batches: BTreeMap::new(),
            unwrap_index: BTreeMap::new(),
        }
    }
}

impl BatchBook {
    pub fn batch(&self, batch_id: u64) -> Option<&BatchRecord> {
        self.batches.get(&batch_id)
    }

    /// Record for `batch_id`, created zero-valued on first use
    pub fn batch_mut(&mut self, batch_id: u64) -> &mut BatchRecord {
        self.batches.entry(batch_id).or_default()
    }

    pub fn batch_for_unwrap(&self, handle: &Handle) -> Result<u64> {
        self.unwrap_index
            .get(handle)
            .copied()
            .ok_or_else(|| error!(BatchError::UnknownUnwrapHandle))
    }

    pub fn status(&self, batch_id: u64) -> Result<BatchStatus> {
        require!(batch_id != 0, BatchError::InvalidBatchId);

        if batch_id >= self.current_batch_id {
            return Ok(BatchStatus::Open);
        }
        match self.batch(batch_id).and_then(|batch| batch.exchange_rate) {
            Some(_) => Ok(BatchStatus::Finalized),
            None => Ok(BatchStatus::Dispatched),
        }
    }
}
