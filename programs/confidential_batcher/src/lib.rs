//! Confidential Batcher
//!
//! Pools amount-hidden deposits into numbered batches, redeems each batch
//! total through an asynchronous decryption oracle, runs a pluggable route on
//! the revealed total and pays every depositor back pro-rata to a deposit that
//! is never revealed.
//!
//! The engine is generic over the capabilities it consumes (encrypted
//! arithmetic, confidential ledgers, the route). [`clear`] implements all of
//! them over plaintext values for local simulation and tests.
//!
//! This is a library crate with no entrypoint. [`BatchBook`] is an Anchor
//! account type, so a program that supplies concrete capabilities can keep it
//! in an account and rebuild the engine with [`BatchEngine::with_book`].

use anchor_lang::prelude::*;

pub mod capabilities;
pub mod clear;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod events;
pub mod handle;
pub mod state;

mod batch_ledger;
mod settlement;


pub use capabilities::{ConfidentialLedger, EncryptedArithmetic, Route};
pub use distribution::RateSlot;
pub use engine::BatchEngine;
pub use error::BatchError;
pub use handle::{DepositInput, Handle};
pub use settlement::SettlementPath;
pub use state::{BatchBook, BatchRecord, BatchStatus};

declare_id!("FoAuEJPePj6J5GPzHVLPv62VT9GrxfnM4YomV9UUuRPk");

/// Fixed-point scale of every exchange rate (1e18 == 1:1)
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Id of the batch that receives the first joins
pub const FIRST_BATCH_ID: u64 = 1;
