use anchor_lang::prelude::*;

use super::{ClearError, Coprocessor, Kind};
use crate::handle::Handle;

/// Decryption result as delivered to a settle callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decryption {
    pub handle: Handle,
    pub cleartext: u64,
    pub proof: Vec<u8>,
}

/// Off-chain decryption service for publicly decryptable handles
#[derive(Debug, Clone)]
pub struct Oracle {
    coprocessor: Coprocessor,
}

impl Oracle {
    pub(crate) fn new(coprocessor: Coprocessor) -> Self {
        Self { coprocessor }
    }

    pub fn decrypt(&self, handle: &Handle) -> Result<Decryption> {
        require!(
            self.coprocessor.is_public(handle),
            ClearError::NotPubliclyDecryptable
        );
        let ciphertext = self.coprocessor.peek(handle)?;
        require!(ciphertext.kind == Kind::U64, ClearError::KindMismatch);

        let cleartext = ciphertext.value as u64;
        let proof = self.coprocessor.decryption_proof(&[*handle], &[cleartext])?;
        msg!("Oracle: decrypted {:?}", handle);

        Ok(Decryption {
            handle: *handle,
            cleartext,
            proof: proof.to_vec(),
        })
    }
}
