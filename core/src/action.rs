//! Inputs to the marketplace reducer.

use crate::types::{Address, Amount, CallContext, EventId};
use serde::{Deserialize, Serialize};

/// Everything a caller can ask the marketplace to do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketplaceAction {
    /// Append a new event (admin only)
    CreateEvent {
        /// Capacity
        max_tickets: u128,
        /// Native unit price
        price_native: Amount,
        /// Token unit price
        price_token: Amount,
    },

    /// Raise an event's capacity (admin only)
    SetMaxTickets {
        /// Event to update
        event_id: EventId,
        /// New capacity, at least the current one
        new_max: u128,
    },

    /// Change an event's native unit price (admin only)
    SetPriceNative {
        /// Event to update
        event_id: EventId,
        /// New price
        price: Amount,
    },

    /// Change an event's token unit price (admin only)
    SetPriceToken {
        /// Event to update
        event_id: EventId,
        /// New price
        price: Amount,
    },

    /// Point the token rail at another token (admin only)
    SetTokenRail {
        /// New token address
        token: Address,
    },

    /// Hand admin rights to another principal (admin only)
    TransferOwnership {
        /// New admin
        new_owner: Address,
    },

    /// Buy tickets with native currency attached to the call
    BuyNative {
        /// Event to buy from
        event_id: EventId,
        /// Number of tickets
        ticket_count: u128,
    },

    /// Buy tickets with tokens pulled from the caller
    BuyToken {
        /// Event to buy from
        event_id: EventId,
        /// Number of tickets
        ticket_count: u128,
    },
}

impl MarketplaceAction {
    /// Whether the action may carry native currency
    #[must_use]
    pub const fn is_payable(&self) -> bool {
        matches!(self, Self::BuyNative { .. })
    }

    /// Whether the action is restricted to the admin
    #[must_use]
    pub const fn is_admin_only(&self) -> bool {
        !matches!(self, Self::BuyNative { .. } | Self::BuyToken { .. })
    }

    /// Short name for logs and metric labels
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateEvent { .. } => "create_event",
            Self::SetMaxTickets { .. } => "set_max_tickets",
            Self::SetPriceNative { .. } => "set_price_native",
            Self::SetPriceToken { .. } => "set_price_token",
            Self::SetTokenRail { .. } => "set_token_rail",
            Self::TransferOwnership { .. } => "transfer_ownership",
            Self::BuyNative { .. } => "buy_native",
            Self::BuyToken { .. } => "buy_token",
        }
    }
}

/// One externally triggered call: who sent it and what it asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Caller and attached native currency
    pub context: CallContext,
    /// Requested action
    pub action: MarketplaceAction,
}

impl Call {
    /// A call with no native currency attached
    #[must_use]
    pub const fn new(caller: Address, action: MarketplaceAction) -> Self {
        Self {
            context: CallContext::new(caller),
            action,
        }
    }

    /// A call with `attached` native currency
    #[must_use]
    pub const fn paying(caller: Address, attached: Amount, action: MarketplaceAction) -> Self {
        Self {
            context: CallContext::paying(caller, attached),
            action,
        }
    }
}
