//! Notifications published to external observers after a call commits.
//!
//! They carry no meaning for the marketplace itself; nothing reads them back.

use crate::types::{Address, Amount, EventId, Rail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A new event was appended to the inventory
    EventCreated {
        /// New event id
        event_id: EventId,
        /// Capacity
        #[serde(with = "crate::serde_with::decimal_u128")]
        max_tickets: u128,
        /// Native unit price
        price_native: Amount,
        /// Token unit price
        price_token: Amount,
    },

    /// Capacity was raised
    MaxTicketsUpdated {
        /// Event id
        event_id: EventId,
        /// New capacity
        #[serde(with = "crate::serde_with::decimal_u128")]
        max_tickets: u128,
    },

    /// A unit price changed
    PriceUpdated {
        /// Event id
        event_id: EventId,
        /// New unit price
        price: Amount,
        /// Rail the price applies to
        rail: Rail,
    },

    /// Tickets were sold and issued
    TicketsBought {
        /// Event id
        event_id: EventId,
        /// Tickets sold by this call
        #[serde(with = "crate::serde_with::decimal_u128")]
        ticket_count: u128,
        /// Rail used to pay
        rail: Rail,
    },

    /// The token-rail address changed
    TokenRailUpdated {
        /// New token address
        token: Address,
    },

    /// Admin rights moved to another principal
    OwnershipTransferred {
        /// Previous admin
        previous_owner: Address,
        /// New admin
        new_owner: Address,
    },
}

impl Notification {
    /// Short name for logs and metric labels
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EventCreated { .. } => "event_created",
            Self::MaxTicketsUpdated { .. } => "max_tickets_updated",
            Self::PriceUpdated { .. } => "price_updated",
            Self::TicketsBought { .. } => "tickets_bought",
            Self::TokenRailUpdated { .. } => "token_rail_updated",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}

/// A committed notification with the time it was published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedNotification {
    /// When the call committed
    pub occurred_at: DateTime<Utc>,
    /// The notification
    pub notification: Notification,
}
