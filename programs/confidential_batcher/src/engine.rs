use anchor_lang::prelude::*;

use crate::capabilities::{ConfidentialLedger, EncryptedArithmetic, Route};
use crate::handle::Handle;
use crate::state::{BatchBook, BatchStatus};

/// Batching and settlement engine.
///
/// * `A` computes on encrypted values as the engine's own account
/// * `D` is the deposit ledger: what depositors join with, redeemable
/// * `P` is the payout ledger: what exits pay in, funded by the route
/// * `R` is the route run on each revealed batch total
///
/// The engine is the only writer of its [`BatchBook`]; capability calls that
/// can fail run before any state is committed.
pub struct BatchEngine<A, D, P, R> {
    pub(crate) arithmetic: A,
    pub(crate) deposit_ledger: D,
    pub(crate) payout_ledger: P,
    pub(crate) route: R,
    pub(crate) book: BatchBook,
}

impl<A, D, P, R> BatchEngine<A, D, P, R>
where
    A: EncryptedArithmetic,
    D: ConfidentialLedger,
    P: ConfidentialLedger,
    R: Route,
{
    pub fn new(arithmetic: A, deposit_ledger: D, payout_ledger: P, route: R) -> Self {
        Self::with_book(arithmetic, deposit_ledger, payout_ledger, route, BatchBook::default())
    }

    /// Resume from a persisted book
    pub fn with_book(
        arithmetic: A,
        deposit_ledger: D,
        payout_ledger: P,
        route: R,
        book: BatchBook,
    ) -> Self {
        msg!(
            "Batch engine {} ready at batch {}",
            arithmetic.account(),
            book.current_batch_id
        );
        Self {
            arithmetic,
            deposit_ledger,
            payout_ledger,
            route,
            book,
        }
    }

    pub fn account(&self) -> Pubkey {
        self.arithmetic.account()
    }

    pub fn current_batch_id(&self) -> u64 {
        self.book.current_batch_id
    }

    pub fn batch_deposits(&self, batch_id: u64, account: &Pubkey) -> Option<Handle> {
        self.book
            .batch(batch_id)
            .and_then(|batch| batch.deposits.get(account).copied())
    }

    pub fn batch_total_deposits(&self, batch_id: u64) -> Option<Handle> {
        self.book
            .batch(batch_id)
            .and_then(|batch| batch.total_deposits)
    }

    pub fn batch_unwrap_amount(&self, batch_id: u64) -> Option<Handle> {
        self.book.batch(batch_id).and_then(|batch| batch.unwrap_amount)
    }

    pub fn batch_exchange_rate(&self, batch_id: u64) -> Option<u128> {
        self.book.batch(batch_id).and_then(|batch| batch.exchange_rate)
    }

    pub fn batch_status(&self, batch_id: u64) -> Result<BatchStatus> {
        self.book.status(batch_id)
    }

    pub fn book(&self) -> &BatchBook {
        &self.book
    }

    pub fn route(&self) -> &R {
        &self.route
    }

    pub fn route_mut(&mut self) -> &mut R {
        &mut self.route
    }

    /// Hand back the capabilities and the book
    pub fn into_parts(self) -> (A, D, P, R, BatchBook) {
        (
            self.arithmetic,
            self.deposit_ledger,
            self.payout_ledger,
            self.route,
            self.book,
        )
    }
}
