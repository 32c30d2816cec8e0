//! Cleartext backend.
//!
//! Implements every capability the engine consumes over plaintext values kept
//! behind handles, with the same access rules a real coprocessor enforces:
//! an account can only compute on, re-share or user-decrypt a handle it has
//! been allowed on. Handles, input proofs and decryption proofs are Poseidon
//! hashes keyed by a backend secret, so a tampered cleartext fails verification.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anchor_lang::prelude::*;
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonBytesHasher};

use crate::handle::Handle;

mod arithmetic;
mod ledger;
mod oracle;

pub use arithmetic::ClearArithmetic;
pub use ledger::{ClearLedger, LedgerClient};
pub use oracle::{Decryption, Oracle};

/// Secret used when none is supplied. Fine for simulation, never for custody.
const DEFAULT_SECRET: [u8; 31] = *b"confidential-batcher-clear-kms!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    U64,
    U128,
}

impl Kind {
    fn mask(self) -> u128 {
        match self {
            Kind::Bool => 1,
            Kind::U64 => u64::MAX as u128,
            Kind::U128 => u128::MAX,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Kind::Bool => 0,
            Kind::U64 => 1,
            Kind::U128 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Ciphertext {
    pub kind: Kind,
    pub value: u128,
}

/// Client-side encrypted amount plus its input proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalInput {
    pub ciphertext: Handle,
    pub proof: Vec<u8>,
}

#[derive(Debug)]
struct Store {
    secret: [u8; 31],
    counter: u64,
    values: HashMap<Handle, Ciphertext>,
    acl: HashMap<Handle, HashSet<Pubkey>>,
    public: HashSet<Handle>,
}

/// Shared handle store. Clones see the same state.
#[derive(Debug, Clone)]
pub struct Coprocessor {
    store: Rc<RefCell<Store>>,
}

impl Default for Coprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Coprocessor {
    pub fn new() -> Self {
        Self::with_secret(DEFAULT_SECRET)
    }

    pub fn with_secret(secret: [u8; 31]) -> Self {
        Self {
            store: Rc::new(RefCell::new(Store {
                secret,
                counter: 0,
                values: HashMap::new(),
                acl: HashMap::new(),
                public: HashSet::new(),
            })),
        }
    }

    /// Arithmetic bound to `account`
    pub fn session(&self, account: Pubkey) -> ClearArithmetic {
        ClearArithmetic::new(self.clone(), account)
    }

    pub fn oracle(&self) -> Oracle {
        Oracle::new(self.clone())
    }

    /// Encrypt `value` client-side for `owner`.
    /// The handle is unusable until ingested with the returned proof.
    pub fn encrypt(&self, value: u64, owner: &Pubkey) -> Result<ExternalInput> {
        let ciphertext = self.issue(Kind::U64, value as u128, None)?;
        let proof = self.input_proof(&ciphertext, owner)?;
        Ok(ExternalInput {
            ciphertext,
            proof: proof.to_vec(),
        })
    }

    /// User decryption: `account` must be allowed on `handle`
    pub fn decrypt_as(&self, handle: &Handle, account: &Pubkey) -> Result<u128> {
        Ok(self.read(handle, account)?.value)
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Pubkey) -> bool {
        self.store
            .borrow()
            .acl
            .get(handle)
            .is_some_and(|allowed| allowed.contains(account))
    }

    pub fn is_public(&self, handle: &Handle) -> bool {
        self.store.borrow().public.contains(handle)
    }

    pub(crate) fn issue(&self, kind: Kind, value: u128, owner: Option<&Pubkey>) -> Result<Handle> {
        let mut store = self.store.borrow_mut();
        store.counter += 1;
        let handle = Handle::new(hash(&[&store.counter.to_be_bytes(), &[kind.tag()]])?);

        store.values.insert(
            handle,
            Ciphertext {
                kind,
                value: value & kind.mask(),
            },
        );
        if let Some(owner) = owner {
            store.acl.entry(handle).or_default().insert(*owner);
        }
        Ok(handle)
    }

    pub(crate) fn grant(&self, handle: &Handle, account: &Pubkey) -> Result<()> {
        let mut store = self.store.borrow_mut();
        require!(store.values.contains_key(handle), ClearError::UnknownHandle);
        store.acl.entry(*handle).or_default().insert(*account);
        Ok(())
    }

    pub(crate) fn publish(&self, handle: &Handle) {
        self.store.borrow_mut().public.insert(*handle);
    }

    /// Value behind `handle` as seen by `account`
    pub(crate) fn read(&self, handle: &Handle, account: &Pubkey) -> Result<Ciphertext> {
        let ciphertext = self.peek(handle)?;
        require!(self.is_allowed(handle, account), ClearError::AccessDenied);
        Ok(ciphertext)
    }

    /// Value behind `handle` without an access check; oracle-side only
    pub(crate) fn peek(&self, handle: &Handle) -> Result<Ciphertext> {
        self.store
            .borrow()
            .values
            .get(handle)
            .copied()
            .ok_or_else(|| error!(ClearError::UnknownHandle))
    }

    pub(crate) fn input_proof(&self, handle: &Handle, owner: &Pubkey) -> Result<[u8; 32]> {
        let secret = self.store.borrow().secret;
        let owner = owner.to_bytes();
        hash(&[&secret, handle.as_bytes(), &owner[..16], &owner[16..]])
    }

    /// Proof over `(handle, cleartext)` pairs, chained in order
    pub(crate) fn decryption_proof(&self, handles: &[Handle], cleartexts: &[u64]) -> Result<[u8; 32]> {
        require!(
            handles.len() == cleartexts.len(),
            ClearError::MalformedCleartexts
        );
        let secret = self.store.borrow().secret;

        let mut acc = hash(&[&secret, &[0u8]])?;
        for (handle, cleartext) in handles.iter().zip(cleartexts) {
            acc = hash(&[&secret, handle.as_bytes(), &cleartext.to_be_bytes(), &acc])?;
        }
        Ok(acc)
    }
}

/// Split 8-byte big-endian cleartext words
pub(crate) fn decode_cleartexts(bytes: &[u8]) -> Result<Vec<u64>> {
    require!(bytes.len() % 8 == 0, ClearError::MalformedCleartexts);
    Ok(bytes
        .chunks_exact(8)
        .map(|word| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(word);
            u64::from_be_bytes(buf)
        })
        .collect())
}

/// Poseidon over BN254, each input left-padded to a 32-byte big-endian word
fn hash(inputs: &[&[u8]]) -> Result<[u8; 32]> {
    let words: Vec<[u8; 32]> = inputs
        .iter()
        .map(|input| {
            let mut word = [0u8; 32];
            word[32 - input.len()..].copy_from_slice(input);
            word
        })
        .collect();
    let words: Vec<&[u8]> = words.iter().map(|word| word.as_slice()).collect();

    let mut poseidon =
        Poseidon::<Fr>::new_circom(words.len()).map_err(|_| error!(ClearError::Hashing))?;
    poseidon
        .hash_bytes_be(&words)
        .map_err(|_| error!(ClearError::Hashing))
}

#[error_code(offset = 6100)]
pub enum ClearError {
    #[msg("Unknown handle")]
    UnknownHandle,
    #[msg("Account is not allowed on this handle")]
    AccessDenied,
    #[msg("Operand kinds do not match")]
    KindMismatch,
    #[msg("Input proof does not match ciphertext and owner")]
    InvalidInputProof,
    #[msg("Decryption proof does not match handles and cleartexts")]
    InvalidDecryptionProof,
    #[msg("Cleartexts must be 8-byte words, one per handle")]
    MalformedCleartexts,
    #[msg("Handle is not publicly decryptable")]
    NotPubliclyDecryptable,
    #[msg("Division by zero")]
    DivisionByZero,
    #[msg("Poseidon hashing failed")]
    Hashing,
    #[msg("Caller is not an operator for this holder")]
    NotOperator,
    #[msg("Unknown redemption")]
    UnknownRedemption,
    #[msg("Redemption already finalized")]
    RedemptionAlreadyFinalized,
    #[msg("Released total overflows")]
    ReleasedOverflow,
}
