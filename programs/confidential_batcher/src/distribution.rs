//! Proportional distribution: the write-once batch rate and the payout it implies.

use anchor_lang::prelude::*;

use crate::capabilities::EncryptedArithmetic;
use crate::error::BatchError;
use crate::handle::Handle;
use crate::RATE_SCALE;

/// Single-assignment exchange rate slot of one batch, lent to the route.
///
/// `consumed` is the batch's unwrap amount. Every deposit in the batch is at
/// most that, so a rate whose payout fits for `consumed` fits for any deposit.
pub struct RateSlot<'a> {
    batch_id: u64,
    consumed: u64,
    rate: &'a mut Option<u128>,
}

impl<'a> RateSlot<'a> {
    pub(crate) fn new(batch_id: u64, consumed: u64, rate: &'a mut Option<u128>) -> Self {
        Self {
            batch_id,
            consumed,
            rate,
        }
    }

    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn get(&self) -> Option<u128> {
        *self.rate
    }

    /// Write the rate. A second write for the same batch is rejected.
    pub fn set(&mut self, rate: u128) -> Result<()> {
        require!(self.rate.is_none(), BatchError::ExchangeRateAlreadySet);
        require!(rate > 0, BatchError::ZeroExchangeRate);
        require!(
            max_payout(self.consumed, rate).is_some(),
            BatchError::ExchangeRateOverflow
        );

        *self.rate = Some(rate);
        msg!("Batch {}: exchange rate fixed at {}", self.batch_id, rate);
        Ok(())
    }

    /// Set the rate from what the route produced for what it consumed
    pub fn fix(&mut self, produced: u64, consumed: u64) -> Result<u128> {
        let rate = exchange_rate(produced, consumed)?;
        self.set(rate)?;
        Ok(rate)
    }
}

/// `floor(deposit * rate / RATE_SCALE)` when both the product and the
/// quotient stay in range
pub fn max_payout(deposit: u64, rate: u128) -> Option<u64> {
    let scaled = (deposit as u128).checked_mul(rate)?;
    u64::try_from(scaled / RATE_SCALE).ok()
}

/// `produced * RATE_SCALE / consumed`, floored
pub fn exchange_rate(produced: u64, consumed: u64) -> Result<u128> {
    require!(consumed > 0, BatchError::ZeroUnwrapAmount);
    // u64 * 1e18 < 2^128
    Ok(produced as u128 * RATE_SCALE / consumed as u128)
}

/// Encrypted `floor(deposit * rate / RATE_SCALE)`.
///
/// The product is taken at 128 bits: a 64-bit deposit times an 18-decimal
/// rate overflows 64 bits long before the quotient does.
pub fn encrypted_payout<A: EncryptedArithmetic>(
    arithmetic: &mut A,
    deposit: &Handle,
    rate: u128,
) -> Result<Handle> {
    let wide = arithmetic.widen(deposit)?;
    let scaled = arithmetic.mul_scalar(&wide, rate)?;
    let quotient = arithmetic.div_scalar(&scaled, RATE_SCALE)?;
    arithmetic.narrow(&quotient)
}
