use anchor_lang::prelude::*;

use super::{decode_cleartexts, Ciphertext, ClearError, Coprocessor, Kind};
use crate::capabilities::EncryptedArithmetic;
use crate::handle::Handle;

/// [`EncryptedArithmetic`] over the cleartext store, computing as one account.
/// Results are allowed for that account.
#[derive(Debug, Clone)]
pub struct ClearArithmetic {
    coprocessor: Coprocessor,
    account: Pubkey,
}

impl ClearArithmetic {
    pub(crate) fn new(coprocessor: Coprocessor, account: Pubkey) -> Self {
        Self {
            coprocessor,
            account,
        }
    }

    pub fn coprocessor(&self) -> &Coprocessor {
        &self.coprocessor
    }

    fn operand(&self, handle: &Handle) -> Result<Ciphertext> {
        self.coprocessor.read(handle, &self.account)
    }

    fn integer(&self, handle: &Handle) -> Result<Ciphertext> {
        let ciphertext = self.operand(handle)?;
        require!(ciphertext.kind != Kind::Bool, ClearError::KindMismatch);
        Ok(ciphertext)
    }

    fn same_kind(&self, lhs: &Handle, rhs: &Handle) -> Result<(Ciphertext, Ciphertext)> {
        let lhs = self.integer(lhs)?;
        let rhs = self.integer(rhs)?;
        require!(lhs.kind == rhs.kind, ClearError::KindMismatch);
        Ok((lhs, rhs))
    }

    fn result(&self, kind: Kind, value: u128) -> Result<Handle> {
        self.coprocessor.issue(kind, value, Some(&self.account))
    }
}

impl EncryptedArithmetic for ClearArithmetic {
    fn account(&self) -> Pubkey {
        self.account
    }

    fn ingest(&mut self, ciphertext: &Handle, proof: &[u8], owner: &Pubkey) -> Result<Handle> {
        let expected = self.coprocessor.input_proof(ciphertext, owner)?;
        require!(proof == expected.as_slice(), ClearError::InvalidInputProof);
        require!(
            self.coprocessor.peek(ciphertext)?.kind == Kind::U64,
            ClearError::KindMismatch
        );

        self.coprocessor.grant(ciphertext, owner)?;
        self.coprocessor.grant(ciphertext, &self.account)?;
        Ok(*ciphertext)
    }

    fn is_allowed(&self, handle: &Handle, account: &Pubkey) -> bool {
        self.coprocessor.is_allowed(handle, account)
    }

    fn allow(&mut self, handle: &Handle, account: &Pubkey) -> Result<()> {
        // only an account that can use a handle may share it
        self.operand(handle)?;
        self.coprocessor.grant(handle, account)
    }

    fn constant(&mut self, value: u64) -> Result<Handle> {
        self.result(Kind::U64, value as u128)
    }

    fn add(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle> {
        let (lhs, rhs) = self.same_kind(lhs, rhs)?;
        self.result(lhs.kind, lhs.value.wrapping_add(rhs.value))
    }

    fn sub(&mut self, lhs: &Handle, rhs: &Handle) -> Result<Handle> {
        let (lhs, rhs) = self.same_kind(lhs, rhs)?;
        self.result(lhs.kind, lhs.value.wrapping_sub(rhs.value))
    }

    fn underflows(&mut self, minuend: &Handle, subtrahend: &Handle) -> Result<Handle> {
        let (minuend, subtrahend) = self.same_kind(minuend, subtrahend)?;
        self.result(Kind::Bool, (minuend.value < subtrahend.value) as u128)
    }

    fn select(
        &mut self,
        condition: &Handle,
        if_true: &Handle,
        if_false: &Handle,
    ) -> Result<Handle> {
        let condition = self.operand(condition)?;
        require!(condition.kind == Kind::Bool, ClearError::KindMismatch);
        let if_true = self.operand(if_true)?;
        let if_false = self.operand(if_false)?;
        require!(if_true.kind == if_false.kind, ClearError::KindMismatch);

        let chosen = if condition.value == 1 { if_true } else { if_false };
        self.result(chosen.kind, chosen.value)
    }

    fn widen(&mut self, value: &Handle) -> Result<Handle> {
        let value = self.operand(value)?;
        require!(value.kind == Kind::U64, ClearError::KindMismatch);
        self.result(Kind::U128, value.value)
    }

    fn narrow(&mut self, value: &Handle) -> Result<Handle> {
        let value = self.operand(value)?;
        require!(value.kind == Kind::U128, ClearError::KindMismatch);
        self.result(Kind::U64, value.value)
    }

    fn mul_scalar(&mut self, value: &Handle, scalar: u128) -> Result<Handle> {
        let value = self.integer(value)?;
        self.result(value.kind, value.value.wrapping_mul(scalar))
    }

    fn div_scalar(&mut self, value: &Handle, divisor: u128) -> Result<Handle> {
        require!(divisor != 0, ClearError::DivisionByZero);
        let value = self.integer(value)?;
        self.result(value.kind, value.value / divisor)
    }

    fn make_publicly_decryptable(&mut self, handle: &Handle) -> Result<()> {
        self.operand(handle)?;
        self.coprocessor.publish(handle);
        Ok(())
    }

    fn verify_decryption(
        &self,
        handles: &[Handle],
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<()> {
        let cleartexts = decode_cleartexts(cleartexts)?;
        require!(
            cleartexts.len() == handles.len(),
            ClearError::MalformedCleartexts
        );

        let expected = self.coprocessor.decryption_proof(handles, &cleartexts)?;
        require!(
            proof == expected.as_slice(),
            ClearError::InvalidDecryptionProof
        );
        Ok(())
    }
}
