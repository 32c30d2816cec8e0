//! Join, quit, dispatch and exit.

use anchor_lang::prelude::*;

use crate::capabilities::{ConfidentialLedger, EncryptedArithmetic, Route};
use crate::distribution::encrypted_payout;
use crate::engine::BatchEngine;
use crate::error::BatchError;
use crate::events::{BatchDispatched, Exited, Joined, Quit};
use crate::handle::{DepositInput, Handle};

impl<A, D, P, R> BatchEngine<A, D, P, R>
where
    A: EncryptedArithmetic,
    D: ConfidentialLedger,
    P: ConfidentialLedger,
    R: Route,
{
    /// Deposit into the current batch. Returns the id of the batch joined.
    ///
    /// What gets recorded is the amount the deposit ledger actually moved,
    /// which is zero if the caller could not cover the request.
    pub fn join(&mut self, caller: &Pubkey, input: DepositInput) -> Result<u64> {
        let amount = match input {
            DepositInput::Fresh { ciphertext, proof } => {
                self.arithmetic.ingest(&ciphertext, &proof, caller)?
            }
            DepositInput::Held(handle) => {
                require!(
                    self.arithmetic.is_allowed(&handle, caller),
                    BatchError::AmountNotAllowed
                );
                handle
            }
        };

        self.arithmetic
            .allow(&amount, &self.deposit_ledger.account())?;
        let transferred = self.deposit_ledger.transfer_in(caller, &amount)?;

        let batch_id = self.book.current_batch_id;
        let (previous_deposit, previous_total) = match self.book.batch(batch_id) {
            Some(batch) => (batch.deposits.get(caller).copied(), batch.total_deposits),
            None => (None, None),
        };

        let deposit = match previous_deposit {
            Some(previous) => self.arithmetic.add(&previous, &transferred)?,
            None => transferred,
        };
        let total = match previous_total {
            Some(previous) => self.arithmetic.add(&previous, &transferred)?,
            None => transferred,
        };
        self.arithmetic.allow_self(&deposit)?;
        self.arithmetic.allow(&deposit, caller)?;
        self.arithmetic.allow_self(&total)?;

        let batch = self.book.batch_mut(batch_id);
        batch.deposits.insert(*caller, deposit);
        batch.total_deposits = Some(total);

        msg!("Join: batch={}, account={}", batch_id, caller);
        emit!(Joined {
            batch_id,
            account: *caller,
            deposit,
        });

        Ok(batch_id)
    }

    /// Withdraw a deposit from the current batch before it is dispatched.
    /// Returns the refunded amount.
    ///
    /// Only what the deposit ledger actually moved is taken off the deposit
    /// and the total; if it moved zero the deposit stays in the batch.
    pub fn quit(&mut self, caller: &Pubkey, batch_id: u64) -> Result<Handle> {
        require!(batch_id != 0, BatchError::InvalidBatchId);
        require!(
            batch_id >= self.book.current_batch_id,
            BatchError::BatchAlreadyDispatched
        );
        require!(
            batch_id == self.book.current_batch_id,
            BatchError::InvalidBatchId
        );

        let (deposit, total) = match self.book.batch(batch_id) {
            Some(batch) => (batch.deposits.get(caller).copied(), batch.total_deposits),
            None => (None, None),
        };
        let requested = match deposit {
            Some(deposit) => deposit,
            None => self.arithmetic.constant(0)?,
        };

        self.arithmetic
            .allow(&requested, &self.deposit_ledger.account())?;
        let refund = self.deposit_ledger.transfer_out(caller, &requested)?;

        if let (Some(deposit), Some(total)) = (deposit, total) {
            let remaining = self.arithmetic.sub(&deposit, &refund)?;
            let total = self.arithmetic.sub(&total, &refund)?;
            self.arithmetic.allow_self(&remaining)?;
            self.arithmetic.allow(&remaining, caller)?;
            self.arithmetic.allow_self(&total)?;

            let batch = self.book.batch_mut(batch_id);
            batch.deposits.insert(*caller, remaining);
            batch.total_deposits = Some(total);
        }

        msg!("Quit: batch={}, account={}", batch_id, caller);
        emit!(Quit {
            batch_id,
            account: *caller,
            refund,
        });

        Ok(refund)
    }

    /// Seal the current batch and request redemption of its clamped total.
    /// Returns the dispatched batch id; the rate is fixed later by the settle callback.
    pub fn dispatch(&mut self) -> Result<u64> {
        let batch_id = self.book.current_batch_id;

        let requested = self.clamped_unwrap_amount(batch_id)?;
        self.arithmetic
            .allow(&requested, &self.deposit_ledger.account())?;
        let unwrap_amount = self.deposit_ledger.request_redemption(&requested)?;
        self.arithmetic.make_publicly_decryptable(&unwrap_amount)?;

        self.book.current_batch_id = batch_id + 1;
        self.book.batch_mut(batch_id).unwrap_amount = Some(unwrap_amount);
        self.book.unwrap_index.insert(unwrap_amount, batch_id);

        msg!(
            "Dispatch: batch={}, next batch={}",
            batch_id,
            self.book.current_batch_id
        );
        emit!(BatchDispatched {
            batch_id,
            unwrap_amount,
        });

        Ok(batch_id)
    }

    /// Pay out the caller's share of a settled batch.
    /// A second exit for the same batch pays zero.
    pub fn exit(&mut self, caller: &Pubkey, batch_id: u64) -> Result<Handle> {
        let rate = self
            .book
            .batch(batch_id)
            .and_then(|batch| batch.exchange_rate)
            .ok_or_else(|| error!(BatchError::BatchNotFinalized))?;

        let zero = self.arithmetic.constant(0)?;
        let previous = self.batch_deposits(batch_id, caller);
        // zeroed before the payout call leaves the engine
        if previous.is_some() {
            self.book.batch_mut(batch_id).deposits.insert(*caller, zero);
        }
        let deposit = previous.unwrap_or(zero);

        let payout = match self.pay_out(caller, &deposit, rate) {
            Ok(payout) => payout,
            Err(err) => {
                if let Some(previous) = previous {
                    self.book
                        .batch_mut(batch_id)
                        .deposits
                        .insert(*caller, previous);
                }
                return Err(err);
            }
        };

        msg!("Exit: batch={}, account={}", batch_id, caller);
        emit!(Exited {
            batch_id,
            account: *caller,
            payout,
        });

        Ok(payout)
    }

    fn pay_out(&mut self, caller: &Pubkey, deposit: &Handle, rate: u128) -> Result<Handle> {
        let amount = encrypted_payout(&mut self.arithmetic, deposit, rate)?;
        self.arithmetic
            .allow(&amount, &self.payout_ledger.account())?;
        let paid = self.payout_ledger.transfer_out(caller, &amount)?;
        self.arithmetic.allow(&paid, caller)?;
        Ok(paid)
    }
}
