use anchor_lang::prelude::*;

use crate::handle::Handle;

// Events never carry a per-account plaintext amount.

#[event]
pub struct Joined {
    pub batch_id: u64,
    pub account: Pubkey,
    pub deposit: Handle,
}

#[event]
pub struct Quit {
    pub batch_id: u64,
    pub account: Pubkey,
    pub refund: Handle,
}

#[event]
pub struct BatchDispatched {
    pub batch_id: u64,
    pub unwrap_amount: Handle,
}

#[event]
pub struct BatchSettled {
    pub batch_id: u64,
    pub unwrap_amount: u64,
    pub exchange_rate: u128,
    pub fallback: bool,
}

#[event]
pub struct Exited {
    pub batch_id: u64,
    pub account: Pubkey,
    pub payout: Handle,
}
