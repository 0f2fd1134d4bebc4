//! Issuance Adapter: turns an accepted purchase into one mint per ticket.
//!
//! No retries here. The first refused mint aborts the purchase and the
//! runtime undoes whatever was already minted.

use crate::collaborators::TicketIssuer;
use crate::error::{MarketplaceError, Result};
use crate::types::{Address, EventId, SeatIndex, TicketId};
use std::ops::Range;

/// Ticket ids for `seats` of `event_id`, in seat order.
pub fn ticket_ids(event_id: EventId, seats: Range<SeatIndex>) -> impl Iterator<Item = TicketId> {
    (seats.start.get()..seats.end.get()).map(move |seat| TicketId::pack(event_id, SeatIndex::new(seat)))
}

/// Mints tickets through the issuer on behalf of the marketplace.
pub struct IssuanceAdapter<'a> {
    issuer: &'a dyn TicketIssuer,
    minter: Address,
}

impl<'a> IssuanceAdapter<'a> {
    /// Create an adapter minting as `minter`
    #[must_use]
    pub fn new(issuer: &'a dyn TicketIssuer, minter: Address) -> Self {
        Self { issuer, minter }
    }

    /// Mint `ticket_id` to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::IssuanceFailed`] if the issuer refuses.
    pub fn issue(&self, owner: &Address, ticket_id: TicketId) -> Result<()> {
        self.issuer
            .mint_from_marketplace(&self.minter, owner, ticket_id)
            .map_err(|e| MarketplaceError::IssuanceFailed {
                ticket_id,
                reason: e.to_string(),
            })?;
        tracing::trace!(%owner, %ticket_id, "Ticket issued");
        Ok(())
    }

    /// Undo a mint of the current purchase.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::IssuanceFailed`] if the issuer refuses.
    pub fn revoke(&self, ticket_id: TicketId) -> Result<()> {
        self.issuer
            .revoke(&self.minter, ticket_id)
            .map_err(|e| MarketplaceError::IssuanceFailed {
                ticket_id,
                reason: e.to_string(),
            })
    }
}
