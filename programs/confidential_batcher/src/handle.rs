use std::fmt;

use anchor_lang::prelude::*;

/// Opaque reference to an encrypted value.
/// The plaintext behind it is only reachable through the arithmetic backend.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

impl From<[u8; 32]> for Handle {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Amount supplied to `join`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositInput {
    /// Ciphertext produced client-side, with a proof that the caller knows its plaintext
    Fresh { ciphertext: Handle, proof: Vec<u8> },
    /// Handle the caller can already read (e.g. a previous payout)
    Held(Handle),
}
