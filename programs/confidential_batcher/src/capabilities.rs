//! Capabilities the batch engine consumes but does not implement.
//!
//! Every method acts on behalf of the account a capability instance is bound
//! to (for the engine's instances: the engine itself). Operations on encrypted
//! values fail only on permission or malformed input, never on the hidden value.

use anchor_lang::prelude::*;

use crate::distribution::RateSlot;
use crate::handle::Handle;

/// Homomorphic integer arithmetic over [`Handle`]s.
///
/// Amounts are 64-bit; `widen`/`narrow` move between 64 and 128 bits for
/// the fixed-point payout. Arithmetic wraps at the operand width.
pub trait EncryptedArithmetic {
    /// Account this instance computes as
    fn account(&self) -> Pubkey;

    /// Accept a client-encrypted amount whose input proof binds it to `owner`.
    /// Both `owner` and the bound account may use the returned handle.
    fn ingest(&mut self, ciphertext: &Handle, proof: &[u8], owner: &Pubkey) -> Result<Handle>;

    fn is_allowed(&self, handle: &Handle, account: &Pubkey) -> bool;

    fn allow(&mut self, handle: &Handle, account: &Pubkey) -> Result<()>;

    fn allow_self(&mut self, handle: &Handle) -> Result<()> {
        let account = self.account();
        self.allow(handle, &account)
    }

    /// Trivially encrypted 64-bit constant
    fn constant(&mut self, value: u64) -> Result<Handle>;

    fn add(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle>;

    fn sub(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle>;

    /// Encrypted boolean: would `minuend - subtrahend` underflow
    fn underflows(&mut self, minuend: &Handle, subtrahend: &Handle) -> Result<Handle>;

    /// Oblivious select; both branches are always evaluated by the caller
    fn select(&mut self, condition: &Handle, if_true: &Handle, if_false: &Handle)
        -> Result<Handle>;

    /// 64 -> 128 bit
    fn widen(&mut self, value: &Handle) -> Result<Handle>;

    /// 128 -> 64 bit, truncating
    fn narrow(&mut self, value: &Handle) -> Result<Handle>;

    fn mul_scalar(&mut self, value: &Handle, scalar: u128) -> Result<Handle>;

    /// Floor division by a plaintext divisor
    fn div_scalar(&mut self, value: &Handle, divisor: u128) -> Result<Handle>;

    /// Let the decryption oracle reveal this handle to anyone
    fn make_publicly_decryptable(&mut self, handle: &Handle) -> Result<()>;

    /// Check an oracle proof that `cleartexts` (8-byte big-endian words, one per
    /// handle) are the plaintexts of `handles`
    fn verify_decryption(&self, handles: &[Handle], cleartexts: &[u8], proof: &[u8])
        -> Result<()>;
}

/// Confidential balance-holding asset
pub trait ConfidentialLedger {
    /// Account of the ledger itself; it needs access to handles it moves
    fn account(&self) -> Pubkey;

    fn balance_of(&self, holder: &Pubkey) -> Option<Handle>;

    /// Pull `amount` from `from` into the bound account's custody.
    /// Returns the amount actually moved, which the ledger may clamp to zero.
    fn transfer_in(&mut self, from: &Pubkey, amount: &Handle) -> Result<Handle>;

    /// Send `amount` from the bound account to `to`; returns the amount moved
    fn transfer_out(&mut self, to: &Pubkey, amount: &Handle) -> Result<Handle>;

    /// Burn `amount` from the bound account pending plaintext release.
    /// Returns the handle that must be decrypted to finalize the redemption.
    fn request_redemption(&mut self, amount: &Handle) -> Result<Handle>;

    /// Release a redemption given its decrypted amount and oracle proof.
    /// May fail for reasons unrelated to the proof, e.g. already finalized.
    fn finalize_redemption(&mut self, handle: &Handle, cleartext: u64, proof: &[u8])
        -> Result<()>;
}

/// Off-batch action run on a batch's revealed total.
///
/// Must fix the batch rate through `rate` before returning `Ok`.
pub trait Route {
    fn execute(&mut self, batch_id: u64, unwrap_amount: u64, rate: &mut RateSlot<'_>)
        -> Result<()>;
}
