//! Contracts of the external components the marketplace calls into.
//!
//! The marketplace never owns token balances or ticket records. It talks to
//! a fungible-token ledger and a collectible issuer through these traits, so
//! production wiring and test doubles (failing, reentrant, recording) are
//! interchangeable.
//!
//! Both traits are synchronous: a call either returns or fails before the
//! marketplace continues. Implementations are code the marketplace does not
//! control and may call back into it.

use crate::error::CollaboratorError;
use crate::types::{Address, Amount, TicketId};

/// Result of a collaborator call
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// ERC-20-like fungible token ledger.
pub trait TokenLedger: Send + Sync {
    /// Balance held by `account`
    ///
    /// # Errors
    ///
    /// Returns error if the ledger cannot answer.
    fn balance_of(&self, account: &Address) -> CollaboratorResult<Amount>;

    /// Amount `spender` may still pull from `owner`
    ///
    /// # Errors
    ///
    /// Returns error if the ledger cannot answer.
    fn allowance(&self, owner: &Address, spender: &Address) -> CollaboratorResult<Amount>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    ///
    /// `Ok(false)` signals a refused transfer, as a boolean-returning token would.
    ///
    /// # Errors
    ///
    /// Returns error if the ledger reverts.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> CollaboratorResult<bool>;

    /// Move `amount` from `sender`'s own balance to `to`.
    ///
    /// The marketplace only uses this to hand pulled funds back when a purchase
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Returns error if the ledger reverts.
    fn transfer(&self, sender: &Address, to: &Address, amount: Amount) -> CollaboratorResult<bool>;
}

/// Collectible issuer that mints one unique record per sold ticket.
pub trait TicketIssuer: Send + Sync {
    /// Mint `ticket_id` to `owner`.
    ///
    /// Implementations must reject a `minter` other than the marketplace, the
    /// zero owner, and an id that already exists. They must fail, never
    /// silently skip.
    ///
    /// # Errors
    ///
    /// Returns error if the mint is refused.
    fn mint_from_marketplace(
        &self,
        minter: &Address,
        owner: &Address,
        ticket_id: TicketId,
    ) -> CollaboratorResult<()>;

    /// Remove a ticket minted by the current, failing purchase.
    ///
    /// # Errors
    ///
    /// Returns error if the ticket does not exist or `minter` is not the marketplace.
    fn revoke(&self, minter: &Address, ticket_id: TicketId) -> CollaboratorResult<()>;
}
