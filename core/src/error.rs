//! Error types for the ticket marketplace.
//!
//! Every error aborts the whole call. Nothing is partially applied, and the
//! `Display` text is the human-readable reason handed back to the caller.

use crate::types::{Address, Amount, EventId, TicketId};
use thiserror::Error;

/// Why a marketplace call was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    /// Caller is not the admin
    #[error("Unauthorized access: {caller} is not the marketplace owner")]
    Unauthorized {
        /// The rejected caller
        caller: Address,
    },

    /// Event id does not name a created event
    #[error("Invalid event ID: {event_id} (events created: {event_count})")]
    InvalidEventId {
        /// The requested id
        event_id: EventId,
        /// Number of events that exist
        event_count: u128,
    },

    /// Zero tickets requested
    #[error("Ticket count must be > 0")]
    InvalidQuantity,

    /// Capacity may only be raised
    #[error("The new number of max tickets is too small! ({requested} < {current})")]
    CapacityDecreaseRejected {
        /// Current capacity
        current: u128,
        /// Requested capacity
        requested: u128,
    },

    /// `ticket_count * unit_price` does not fit in 256 bits
    #[error("Ticket price calc overflow: {ticket_count} x {unit_price}")]
    PriceOverflow {
        /// Requested ticket count
        ticket_count: u128,
        /// Unit price on the chosen rail
        unit_price: Amount,
    },

    /// Not enough native currency attached
    #[error("Not enough ETH provided: required {required}, attached {attached}")]
    InsufficientPayment {
        /// Total price
        required: Amount,
        /// Amount attached to the call
        attached: Amount,
    },

    /// Retained native balance would exceed 256 bits
    #[error("Native balance overflow: {balance} + {attached}")]
    BalanceOverflow {
        /// Balance before the call
        balance: Amount,
        /// Amount attached to the call
        attached: Amount,
    },

    /// Not enough seats left
    #[error("Not enough tickets available: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Requested ticket count
        requested: u128,
        /// Seats remaining
        available: u128,
    },

    /// Buyer's token balance is below the total price
    #[error("ERC20 balance too low: required {required}, balance {balance}")]
    InsufficientBalance {
        /// Total price
        required: Amount,
        /// Buyer's balance
        balance: Amount,
    },

    /// Buyer's allowance to the marketplace is below the total price
    #[error("Allowance too low: required {required}, allowance {allowance}")]
    InsufficientAllowance {
        /// Total price
        required: Amount,
        /// Allowance granted to the marketplace
        allowance: Amount,
    },

    /// The token ledger did not move the funds
    #[error("ERC20 transfer failed: {reason}")]
    TokenTransferFailed {
        /// Reported cause
        reason: String,
    },

    /// The issuance collaborator refused to mint a ticket
    #[error("Ticket issuance failed for {ticket_id}: {reason}")]
    IssuanceFailed {
        /// Ticket that could not be minted
        ticket_id: TicketId,
        /// Reported cause
        reason: String,
    },

    /// Native currency attached to a call that does not accept it
    #[error("Call is not payable: {attached} attached")]
    UnexpectedPayment {
        /// Amount attached
        attached: Amount,
    },

    /// No usable token ledger at the configured token-rail address
    #[error("Token rail {token} unavailable: {reason}")]
    TokenRailUnavailable {
        /// Configured token address
        token: Address,
        /// Reported cause
        reason: String,
    },

    /// A collaborator tried to call back into a call that is still running
    #[error("Reentrant call rejected")]
    ReentrantCall,
}

/// Failure reported by an external collaborator (token ledger or ticket issuer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator rejected the call
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The collaborator could not be reached or answered nonsense
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        let err = MarketplaceError::InsufficientInventory {
            requested: 8,
            available: 7,
        };
        assert_eq!(
            err.to_string(),
            "Not enough tickets available: requested 8, available 7"
        );
        assert_eq!(
            MarketplaceError::InvalidQuantity.to_string(),
            "Ticket count must be > 0"
        );
        assert!(
            MarketplaceError::Unauthorized {
                caller: Address::repeat_byte(1)
            }
            .to_string()
            .starts_with("Unauthorized access")
        );
    }

    #[test]
    fn test_collaborator_error_display() {
        let err = CollaboratorError::Reverted("owner is zero".to_string());
        assert_eq!(err.to_string(), "call reverted: owner is zero");
    }
}
