use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anchor_lang::prelude::*;

use super::{ClearArithmetic, ClearError, Coprocessor};
use crate::capabilities::{ConfidentialLedger, EncryptedArithmetic};
use crate::handle::Handle;

#[derive(Debug, Clone, Copy)]
struct Redemption {
    recipient: Pubkey,
    finalized: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Pubkey, Handle>,
    /// (holder, operator)
    operators: HashSet<(Pubkey, Pubkey)>,
    redemptions: HashMap<Handle, Redemption>,
    /// Plaintext funds released by finalized redemptions
    released: HashMap<Pubkey, u64>,
}

/// Confidential token over the cleartext store.
///
/// Transfers and burns clamp obliviously: an amount larger than the balance
/// moves zero instead of failing.
#[derive(Debug, Clone)]
pub struct ClearLedger {
    account: Pubkey,
    coprocessor: Coprocessor,
    state: Rc<RefCell<LedgerState>>,
}

impl ClearLedger {
    pub fn new(coprocessor: &Coprocessor, account: Pubkey) -> Self {
        Self {
            account,
            coprocessor: coprocessor.clone(),
            state: Rc::new(RefCell::new(LedgerState::default())),
        }
    }

    pub fn account(&self) -> Pubkey {
        self.account
    }

    /// Ledger view acting as `caller`
    pub fn connect(&self, caller: Pubkey) -> LedgerClient {
        LedgerClient {
            ledger: self.clone(),
            caller,
        }
    }

    pub fn balance_of(&self, holder: &Pubkey) -> Option<Handle> {
        self.state.borrow().balances.get(holder).copied()
    }

    /// Balance as plaintext; test and simulation helper
    pub fn balance_plaintext(&self, holder: &Pubkey) -> Result<u64> {
        match self.balance_of(holder) {
            Some(balance) => Ok(self.coprocessor.decrypt_as(&balance, holder)? as u64),
            None => Ok(0),
        }
    }

    pub fn mint(&self, to: &Pubkey, amount: u64) -> Result<Handle> {
        let mut arithmetic = self.arithmetic();
        let amount = arithmetic.constant(amount)?;
        let balance = match self.balance_of(to) {
            Some(balance) => arithmetic.add(&balance, &amount)?,
            None => amount,
        };
        arithmetic.allow(&balance, to)?;
        self.state.borrow_mut().balances.insert(*to, balance);
        Ok(balance)
    }

    pub fn set_operator(&self, holder: &Pubkey, operator: &Pubkey) {
        self.state
            .borrow_mut()
            .operators
            .insert((*holder, *operator));
    }

    pub fn is_operator(&self, holder: &Pubkey, operator: &Pubkey) -> bool {
        holder == operator || self.state.borrow().operators.contains(&(*holder, *operator))
    }

    pub fn released(&self, recipient: &Pubkey) -> u64 {
        self.state
            .borrow()
            .released
            .get(recipient)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_finalized(&self, redemption: &Handle) -> bool {
        self.state
            .borrow()
            .redemptions
            .get(redemption)
            .is_some_and(|redemption| redemption.finalized)
    }

    /// Anyone may finalize a redemption with a valid oracle proof
    pub fn finalize_redemption(&self, handle: &Handle, cleartext: u64, proof: &[u8]) -> Result<()> {
        let redemption = self
            .state
            .borrow()
            .redemptions
            .get(handle)
            .copied()
            .ok_or_else(|| error!(ClearError::UnknownRedemption))?;
        require!(
            !redemption.finalized,
            ClearError::RedemptionAlreadyFinalized
        );
        self.arithmetic()
            .verify_decryption(&[*handle], &cleartext.to_be_bytes(), proof)?;
        let released = self
            .released(&redemption.recipient)
            .checked_add(cleartext)
            .ok_or_else(|| error!(ClearError::ReleasedOverflow))?;

        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.redemptions.get_mut(handle) {
            entry.finalized = true;
        }
        state.released.insert(redemption.recipient, released);
        msg!("Ledger: redemption {:?} released", handle);
        Ok(())
    }

    fn arithmetic(&self) -> ClearArithmetic {
        self.coprocessor.session(self.account)
    }

    fn require_usable(&self, amount: &Handle, caller: &Pubkey) -> Result<()> {
        require!(
            self.coprocessor.is_allowed(amount, caller)
                && self.coprocessor.is_allowed(amount, &self.account),
            ClearError::AccessDenied
        );
        Ok(())
    }

    /// Move `min(amount, balance)`-or-zero from `from` to `to`.
    /// Returns the handle of what actually moved.
    fn move_balance(&self, from: &Pubkey, to: &Pubkey, amount: &Handle) -> Result<Handle> {
        let mut arithmetic = self.arithmetic();
        let zero = arithmetic.constant(0)?;

        let from_balance = self.balance_of(from).unwrap_or(zero);
        let underflow = arithmetic.underflows(&from_balance, amount)?;
        let moved = arithmetic.select(&underflow, &zero, amount)?;
        arithmetic.allow(&moved, from)?;
        arithmetic.allow(&moved, to)?;

        if from == to {
            return Ok(moved);
        }

        let from_balance = arithmetic.sub(&from_balance, &moved)?;
        let to_balance = match self.balance_of(to) {
            Some(balance) => arithmetic.add(&balance, &moved)?,
            None => moved,
        };
        arithmetic.allow(&from_balance, from)?;
        arithmetic.allow(&to_balance, to)?;

        let mut state = self.state.borrow_mut();
        state.balances.insert(*from, from_balance);
        state.balances.insert(*to, to_balance);
        Ok(moved)
    }

    fn burn(&self, from: &Pubkey, amount: &Handle) -> Result<Handle> {
        let mut arithmetic = self.arithmetic();
        let zero = arithmetic.constant(0)?;

        let balance = self.balance_of(from).unwrap_or(zero);
        let underflow = arithmetic.underflows(&balance, amount)?;
        let burnt = arithmetic.select(&underflow, &zero, amount)?;
        let balance = arithmetic.sub(&balance, &burnt)?;
        arithmetic.allow(&balance, from)?;
        arithmetic.allow(&burnt, from)?;
        arithmetic.make_publicly_decryptable(&burnt)?;

        let mut state = self.state.borrow_mut();
        state.balances.insert(*from, balance);
        state.redemptions.insert(
            burnt,
            Redemption {
                recipient: *from,
                finalized: false,
            },
        );
        Ok(burnt)
    }
}

/// [`ConfidentialLedger`] bound to one caller
#[derive(Debug, Clone)]
pub struct LedgerClient {
    ledger: ClearLedger,
    caller: Pubkey,
}

impl LedgerClient {
    pub fn ledger(&self) -> &ClearLedger {
        &self.ledger
    }
}

impl ConfidentialLedger for LedgerClient {
    fn account(&self) -> Pubkey {
        self.ledger.account
    }

    fn balance_of(&self, holder: &Pubkey) -> Option<Handle> {
        self.ledger.balance_of(holder)
    }

    fn transfer_in(&mut self, from: &Pubkey, amount: &Handle) -> Result<Handle> {
        require!(
            self.ledger.is_operator(from, &self.caller),
            ClearError::NotOperator
        );
        self.ledger.require_usable(amount, &self.caller)?;
        self.ledger.move_balance(from, &self.caller, amount)
    }

    fn transfer_out(&mut self, to: &Pubkey, amount: &Handle) -> Result<Handle> {
        self.ledger.require_usable(amount, &self.caller)?;
        self.ledger.move_balance(&self.caller, to, amount)
    }

    fn request_redemption(&mut self, amount: &Handle) -> Result<Handle> {
        self.ledger.require_usable(amount, &self.caller)?;
        self.ledger.burn(&self.caller, amount)
    }

    fn finalize_redemption(&mut self, handle: &Handle, cleartext: u64, proof: &[u8]) -> Result<()> {
        self.ledger.finalize_redemption(handle, cleartext, proof)
    }
}
