//! Settlement: clamped unwrap request, then decrypt-verify-route on the callback.

use anchor_lang::prelude::*;

use crate::capabilities::{ConfidentialLedger, EncryptedArithmetic, Route};
use crate::distribution::RateSlot;
use crate::engine::BatchEngine;
use crate::error::BatchError;
use crate::events::BatchSettled;
use crate::handle::Handle;

/// How a settle callback established the unwrap cleartext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementPath {
    /// The deposit ledger verified the proof and released the funds
    Primary,
    /// The ledger call failed; the proof was re-verified by the engine
    Fallback,
}

impl<A, D, P, R> BatchEngine<A, D, P, R>
where
    A: EncryptedArithmetic,
    D: ConfidentialLedger,
    P: ConfidentialLedger,
    R: Route,
{
    /// `select(balance < total, 0, total)`.
    ///
    /// The redeemable balance can trail the summed deposits through rounding on
    /// the underlying asset. Never branches on the comparison.
    pub(crate) fn clamped_unwrap_amount(&mut self, batch_id: u64) -> Result<Handle> {
        let zero = self.arithmetic.constant(0)?;
        let requested = self
            .book
            .batch(batch_id)
            .and_then(|batch| batch.total_deposits)
            .unwrap_or(zero);
        let balance = self
            .deposit_ledger
            .balance_of(&self.arithmetic.account())
            .unwrap_or(zero);

        let underflow = self.arithmetic.underflows(&balance, &requested)?;
        let amount = self.arithmetic.select(&underflow, &zero, &requested)?;
        self.arithmetic.allow_self(&amount)?;
        Ok(amount)
    }

    /// Oracle callback for a dispatched batch.
    ///
    /// Tries the deposit ledger's own finalize first. If that fails for any
    /// reason the proof is verified independently and settlement continues;
    /// an invalid proof is fatal on either path.
    pub fn settle_callback(
        &mut self,
        handle: &Handle,
        cleartext: u64,
        proof: &[u8],
    ) -> Result<SettlementPath> {
        let batch_id = self.book.batch_for_unwrap(handle)?;
        require!(
            self.book
                .batch(batch_id)
                .is_some_and(|batch| batch.exchange_rate.is_none()),
            BatchError::BatchAlreadyFinalized
        );

        let path = match self
            .deposit_ledger
            .finalize_redemption(handle, cleartext, proof)
        {
            Ok(()) => SettlementPath::Primary,
            Err(err) => {
                msg!(
                    "Settle: batch {} ledger finalize failed ({}), verifying proof",
                    batch_id,
                    err
                );
                self.arithmetic
                    .verify_decryption(&[*handle], &cleartext.to_be_bytes(), proof)?;
                SettlementPath::Fallback
            }
        };

        let mut rate = None;
        let mut slot = RateSlot::new(batch_id, cleartext, &mut rate);
        self.route.execute(batch_id, cleartext, &mut slot)?;
        let rate = rate.ok_or_else(|| error!(BatchError::RouteDidNotFixRate))?;

        let batch = self.book.batch_mut(batch_id);
        RateSlot::new(batch_id, cleartext, &mut batch.exchange_rate).set(rate)?;

        msg!(
            "Settle: batch={}, unwrap amount={}, rate={}, path={:?}",
            batch_id,
            cleartext,
            rate,
            path
        );
        emit!(BatchSettled {
            batch_id,
            unwrap_amount: cleartext,
            exchange_rate: rate,
            fallback: path == SettlementPath::Fallback,
        });

        Ok(path)
    }
}
