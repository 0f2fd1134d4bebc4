//! Collectible issuer doubles
//!
//! - [`TicketRegistry`]: ERC-721-like record of tickets, minting only for the
//!   configured marketplace, with an optional injected failure
//! - [`ReentrantTicketIssuer`]: wraps another issuer and runs a hook during
//!   its first mint, standing in for hostile receiver code

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning is the only panic

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use ticket_marketplace_core::{Address, CollaboratorError, CollaboratorResult, TicketId, TicketIssuer};

#[derive(Debug, Default)]
struct Records {
    owners: BTreeMap<TicketId, Address>,
    mint_log: Vec<(Address, TicketId)>,
    mint_attempts: usize,
    fail_on_attempt: Option<usize>,
}

/// In-memory ticket registry.
///
/// Rejects mints from anyone but the configured marketplace, mints to the
/// zero address and duplicate ids, like the production collectible contract.
#[derive(Debug)]
pub struct TicketRegistry {
    marketplace: Address,
    records: Mutex<Records>,
}

impl TicketRegistry {
    /// Registry that accepts mints from `marketplace` only
    #[must_use]
    pub fn new(marketplace: Address) -> Self {
        Self {
            marketplace,
            records: Mutex::new(Records::default()),
        }
    }

    /// Make the `n`th mint attempt from now on (1-based) fail
    pub fn fail_on_mint(&self, n: usize) {
        let mut records = self.records.lock().unwrap();
        records.fail_on_attempt = Some(records.mint_attempts + n);
    }

    /// Owner of `ticket_id`, if minted
    #[must_use]
    pub fn owner_of(&self, ticket_id: TicketId) -> Option<Address> {
        self.records.lock().unwrap().owners.get(&ticket_id).copied()
    }

    /// Number of tickets held by `owner`
    #[must_use]
    pub fn balance_of(&self, owner: &Address) -> usize {
        self.records
            .lock()
            .unwrap()
            .owners
            .values()
            .filter(|held_by| *held_by == owner)
            .count()
    }

    /// All live tickets in id order
    #[must_use]
    pub fn tickets(&self) -> Vec<TicketId> {
        self.records.lock().unwrap().owners.keys().copied().collect()
    }

    /// Every successful mint in call order, revoked ones included
    #[must_use]
    pub fn mint_log(&self) -> Vec<(Address, TicketId)> {
        self.records.lock().unwrap().mint_log.clone()
    }
}

impl TicketIssuer for TicketRegistry {
    fn mint_from_marketplace(
        &self,
        minter: &Address,
        owner: &Address,
        ticket_id: TicketId,
    ) -> CollaboratorResult<()> {
        let mut records = self.records.lock().unwrap();
        records.mint_attempts += 1;

        if records.fail_on_attempt == Some(records.mint_attempts) {
            return Err(CollaboratorError::Reverted("mint failure injected".to_string()));
        }
        if *minter != self.marketplace {
            return Err(CollaboratorError::Reverted(format!(
                "only the marketplace may mint, got {minter}"
            )));
        }
        if owner.is_zero() {
            return Err(CollaboratorError::Reverted("mint to the zero address".to_string()));
        }
        if records.owners.contains_key(&ticket_id) {
            return Err(CollaboratorError::Reverted(format!(
                "ticket {ticket_id} already minted"
            )));
        }

        records.owners.insert(ticket_id, *owner);
        records.mint_log.push((*owner, ticket_id));
        Ok(())
    }

    fn revoke(&self, minter: &Address, ticket_id: TicketId) -> CollaboratorResult<()> {
        if *minter != self.marketplace {
            return Err(CollaboratorError::Reverted(format!(
                "only the marketplace may revoke, got {minter}"
            )));
        }
        self.records
            .lock()
            .unwrap()
            .owners
            .remove(&ticket_id)
            .map(|_| ())
            .ok_or_else(|| CollaboratorError::Reverted(format!("ticket {ticket_id} does not exist")))
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Issuer that calls back into the caller during a mint.
///
/// The hook fires once, before the first mint is forwarded to the inner
/// issuer. Install it after the store exists, since the hook usually needs
/// the store.
pub struct ReentrantTicketIssuer {
    inner: Arc<dyn TicketIssuer>,
    hook: Mutex<Option<Hook>>,
}

impl ReentrantTicketIssuer {
    /// Wrap `inner` with no hook installed
    #[must_use]
    pub fn new(inner: Arc<dyn TicketIssuer>) -> Self {
        Self {
            inner,
            hook: Mutex::new(None),
        }
    }

    /// Install the hook run by the next mint
    pub fn set_hook<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl TicketIssuer for ReentrantTicketIssuer {
    fn mint_from_marketplace(
        &self,
        minter: &Address,
        owner: &Address,
        ticket_id: TicketId,
    ) -> CollaboratorResult<()> {
        // Take the hook first so the lock is released before calling out.
        let hook = self.hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.mint_from_marketplace(minter, owner, ticket_id)
    }

    fn revoke(&self, minter: &Address, ticket_id: TicketId) -> CollaboratorResult<()> {
        self.inner.revoke(minter, ticket_id)
    }
}

impl std::fmt::Debug for ReentrantTicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReentrantTicketIssuer")
            .field("hook_armed", &self.hook.lock().unwrap().is_some())
            .finish_non_exhaustive()
    }
}
