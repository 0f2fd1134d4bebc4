//! In-memory fungible token ledger
//!
//! [`InMemoryTokenLedger`] follows ERC-20 semantics closely enough for the
//! marketplace: balances, allowances, `transfer_from` consuming allowance.
//! Its [`TransferBehavior`] switch makes transfers refuse or revert on demand.
//! [`ReentrantTokenLedger`] wraps any ledger and calls back into the caller
//! from inside one of its methods.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning is the only panic

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use ticket_marketplace_core::{Address, Amount, CollaboratorError, CollaboratorResult, TokenLedger};

/// How `transfer_from` answers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransferBehavior {
    /// Move funds like a well-behaved token
    #[default]
    Normal,
    /// Return `false` without moving anything
    ReturnFalse,
    /// Revert with the given reason
    Revert(String),
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    behavior: TransferBehavior,
    transfer_from_calls: usize,
}

/// ERC-20-like ledger held in memory.
///
/// # Example
///
/// ```
/// use ticket_marketplace_testing::InMemoryTokenLedger;
/// use ticket_marketplace_core::{Address, Amount, TokenLedger};
///
/// let ledger = InMemoryTokenLedger::new();
/// let buyer = Address::repeat_byte(1);
/// ledger.mint(&buyer, Amount::new(500));
/// assert_eq!(ledger.balance_of(&buyer).unwrap(), Amount::new(500));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    book: Mutex<Book>,
}

impl InMemoryTokenLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account`
    pub fn mint(&self, account: &Address, amount: Amount) {
        let mut book = self.book.lock().unwrap();
        let balance = book.balances.entry(*account).or_insert(Amount::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Let `spender` pull up to `amount` from `owner`
    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        self.book
            .lock()
            .unwrap()
            .allowances
            .insert((*owner, *spender), amount);
    }

    /// Change how `transfer_from` answers
    pub fn set_behavior(&self, behavior: TransferBehavior) {
        self.book.lock().unwrap().behavior = behavior;
    }

    /// Number of `transfer_from` calls received, failed ones included
    #[must_use]
    pub fn transfer_from_calls(&self) -> usize {
        self.book.lock().unwrap().transfer_from_calls
    }

    /// Current balance of `account`
    #[must_use]
    pub fn balance(&self, account: &Address) -> Amount {
        self.book
            .lock()
            .unwrap()
            .balances
            .get(account)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Current allowance from `owner` to `spender`
    #[must_use]
    pub fn allowance_of(&self, owner: &Address, spender: &Address) -> Amount {
        self.book
            .lock()
            .unwrap()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}

impl Book {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn move_funds(&mut self, from: &Address, to: &Address, amount: Amount) -> CollaboratorResult<()> {
        let from_balance = self.balance(from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or_else(|| CollaboratorError::Reverted("transfer amount exceeds balance".to_string()))?;
        self.balances.insert(*from, remaining);
        let to_balance = self.balance(to);
        self.balances.insert(*to, to_balance.saturating_add(amount));
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, account: &Address) -> CollaboratorResult<Amount> {
        Ok(self.balance(account))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> CollaboratorResult<Amount> {
        Ok(self.allowance_of(owner, spender))
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> CollaboratorResult<bool> {
        let mut book = self.book.lock().unwrap();
        book.transfer_from_calls += 1;

        match book.behavior.clone() {
            TransferBehavior::Normal => {}
            TransferBehavior::ReturnFalse => return Ok(false),
            TransferBehavior::Revert(reason) => return Err(CollaboratorError::Reverted(reason)),
        }

        let allowed = book
            .allowances
            .get(&(*from, *spender))
            .copied()
            .unwrap_or(Amount::ZERO);
        let left = allowed
            .checked_sub(amount)
            .ok_or_else(|| CollaboratorError::Reverted("insufficient allowance".to_string()))?;
        book.move_funds(from, to, amount)?;
        book.allowances.insert((*from, *spender), left);
        Ok(true)
    }

    fn transfer(&self, sender: &Address, to: &Address, amount: Amount) -> CollaboratorResult<bool> {
        self.book.lock().unwrap().move_funds(sender, to, amount)?;
        Ok(true)
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Ledger method a [`ReentrantTokenLedger`] hook fires in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerCallback {
    /// Balance query made while the purchase is validated
    BalanceOf,
    /// Allowance query made while the purchase is validated
    Allowance,
    /// The pull of the buyer's funds
    TransferFrom,
}

/// Ledger that calls back into the caller from inside one of its methods.
///
/// The hook fires once, the first time the chosen method is called, before
/// the call is forwarded to the inner ledger.
pub struct ReentrantTokenLedger {
    inner: Arc<dyn TokenLedger>,
    hook: Mutex<Option<(LedgerCallback, Hook)>>,
}

impl ReentrantTokenLedger {
    /// Wrap `inner` with no hook installed
    #[must_use]
    pub fn new(inner: Arc<dyn TokenLedger>) -> Self {
        Self {
            inner,
            hook: Mutex::new(None),
        }
    }

    /// Install the hook run by the next call to `at`
    pub fn set_hook<F>(&self, at: LedgerCallback, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.hook.lock().unwrap() = Some((at, Box::new(hook)));
    }

    fn fire(&self, method: LedgerCallback) {
        let hook = {
            let mut slot = self.hook.lock().unwrap();
            match slot.take() {
                Some((at, hook)) if at == method => Some(hook),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl TokenLedger for ReentrantTokenLedger {
    fn balance_of(&self, account: &Address) -> CollaboratorResult<Amount> {
        self.fire(LedgerCallback::BalanceOf);
        self.inner.balance_of(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> CollaboratorResult<Amount> {
        self.fire(LedgerCallback::Allowance);
        self.inner.allowance(owner, spender)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> CollaboratorResult<bool> {
        self.fire(LedgerCallback::TransferFrom);
        self.inner.transfer_from(spender, from, to, amount)
    }

    fn transfer(&self, sender: &Address, to: &Address, amount: Amount) -> CollaboratorResult<bool> {
        self.inner.transfer(sender, to, amount)
    }
}

impl std::fmt::Debug for ReentrantTokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let armed = self.hook.lock().unwrap().as_ref().map(|(at, _)| *at);
        f.debug_struct("ReentrantTokenLedger")
            .field("hook", &armed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let ledger = InMemoryTokenLedger::new();
        let owner = Address::repeat_byte(1);
        let spender = Address::repeat_byte(2);
        ledger.mint(&owner, Amount::new(100));
        ledger.approve(&owner, &spender, Amount::new(60));

        assert_eq!(
            ledger.transfer_from(&spender, &owner, &spender, Amount::new(50)),
            Ok(true)
        );
        assert_eq!(ledger.balance(&owner), Amount::new(50));
        assert_eq!(ledger.balance(&spender), Amount::new(50));
        assert_eq!(ledger.allowance_of(&owner, &spender), Amount::new(10));
        assert!(
            ledger
                .transfer_from(&spender, &owner, &spender, Amount::new(11))
                .is_err()
        );
    }

    #[test]
    fn test_behavior_switch() {
        let ledger = InMemoryTokenLedger::new();
        let owner = Address::repeat_byte(1);
        let spender = Address::repeat_byte(2);
        ledger.mint(&owner, Amount::new(100));
        ledger.approve(&owner, &spender, Amount::new(100));

        ledger.set_behavior(TransferBehavior::ReturnFalse);
        assert_eq!(
            ledger.transfer_from(&spender, &owner, &spender, Amount::new(1)),
            Ok(false)
        );
        ledger.set_behavior(TransferBehavior::Revert("paused".to_string()));
        assert_eq!(
            ledger.transfer_from(&spender, &owner, &spender, Amount::new(1)),
            Err(CollaboratorError::Reverted("paused".to_string()))
        );
        assert_eq!(ledger.balance(&owner), Amount::new(100));
        assert_eq!(ledger.transfer_from_calls(), 2);
    }

    #[test]
    fn test_hook_fires_once_in_chosen_method() {
        let inner = Arc::new(InMemoryTokenLedger::new());
        let owner = Address::repeat_byte(1);
        let spender = Address::repeat_byte(2);
        inner.mint(&owner, Amount::new(10));
        inner.approve(&owner, &spender, Amount::new(10));
        let ledger = ReentrantTokenLedger::new(inner.clone());

        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = Arc::clone(&fired);
            ledger.set_hook(LedgerCallback::Allowance, move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(ledger.balance_of(&owner), Ok(Amount::new(10)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.allowance(&owner, &spender), Ok(Amount::new(10)));
        assert_eq!(ledger.allowance(&owner, &spender), Ok(Amount::new(10)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert_eq!(
            ledger.transfer_from(&spender, &owner, &spender, Amount::new(4)),
            Ok(true)
        );
        assert_eq!(inner.balance(&spender), Amount::new(4));
    }
}
