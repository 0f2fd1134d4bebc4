//! # Ticket Marketplace
//!
//! Typed facade over the marketplace [`Store`]: one method per entry point,
//! each taking the calling principal explicitly.
//!
//! ```ignore
//! let marketplace = Marketplace::new(MarketplaceState::new(admin, token), environment);
//!
//! let event_id = marketplace.create_event(admin, 100, Amount::new(10), Amount::new(5))?;
//! let tickets = marketplace.buy_native(buyer, Amount::new(30), event_id, 3)?;
//! assert_eq!(tickets.len(), 3);
//! ```

pub mod config;
pub mod telemetry;

use ticket_marketplace_core::environment::MarketplaceEnvironment;
use ticket_marketplace_core::inventory;
use ticket_marketplace_core::{
    Address, Amount, Call, EventId, EventRecord, MarketplaceAction, MarketplaceError,
    MarketplaceState, StampedNotification, TicketId,
};
use ticket_marketplace_runtime::{Receipt, Store, StoreConfig};
use tokio::sync::broadcast;

pub use config::{ConfigError, MarketplaceConfig};

/// Result of a marketplace entry point
pub type Result<T> = std::result::Result<T, MarketplaceError>;

/// The ticket marketplace.
pub struct Marketplace<E>
where
    E: MarketplaceEnvironment,
{
    store: Store<E>,
}

impl<E> Marketplace<E>
where
    E: MarketplaceEnvironment,
{
    /// Marketplace starting from `initial_state`
    #[must_use]
    pub fn new(initial_state: MarketplaceState, environment: E) -> Self {
        Self {
            store: Store::new(initial_state, environment),
        }
    }

    /// Fresh marketplace owned and wired as `config` says
    #[must_use]
    pub fn from_config(config: &MarketplaceConfig, environment: E) -> Self {
        let state = MarketplaceState::new(config.owner, config.token_address);
        let store_config =
            StoreConfig::default().with_notification_capacity(config.notification_capacity);
        Self {
            store: Store::with_config(state, environment, store_config),
        }
    }

    /// Submit a raw call.
    ///
    /// # Errors
    ///
    /// Returns the [`MarketplaceError`] that rejected the call.
    pub fn send(&self, call: Call) -> Result<Receipt> {
        self.store.send(call)
    }

    /// Create an event and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] unless `caller` is the owner.
    pub fn create_event(
        &self,
        caller: Address,
        max_tickets: u128,
        price_native: Amount,
        price_token: Amount,
    ) -> Result<EventId> {
        let receipt = self.send(Call::new(
            caller,
            MarketplaceAction::CreateEvent {
                max_tickets,
                price_native,
                price_token,
            },
        ))?;
        // A committed CreateEvent always announces the new id.
        receipt.created_event().ok_or_else(|| {
            let event_count = self.event_count();
            MarketplaceError::InvalidEventId {
                event_id: EventId::new(event_count),
                event_count,
            }
        })
    }

    /// Raise the capacity of an event. Setting the current value is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if `caller` is not the owner, the event does not
    /// exist, or `new_max` is below the current capacity.
    pub fn set_max_tickets(&self, caller: Address, event_id: EventId, new_max: u128) -> Result<()> {
        self.send(Call::new(
            caller,
            MarketplaceAction::SetMaxTickets { event_id, new_max },
        ))
        .map(drop)
    }

    /// Change the native price of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if `caller` is not the owner or the event does not exist.
    pub fn set_price_native(&self, caller: Address, event_id: EventId, price: Amount) -> Result<()> {
        self.send(Call::new(
            caller,
            MarketplaceAction::SetPriceNative { event_id, price },
        ))
        .map(drop)
    }

    /// Change the token price of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if `caller` is not the owner or the event does not exist.
    pub fn set_price_token(&self, caller: Address, event_id: EventId, price: Amount) -> Result<()> {
        self.send(Call::new(
            caller,
            MarketplaceAction::SetPriceToken { event_id, price },
        ))
        .map(drop)
    }

    /// Point the token rail at another ledger. Not validated.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] unless `caller` is the owner.
    pub fn set_token_rail(&self, caller: Address, token: Address) -> Result<()> {
        self.send(Call::new(caller, MarketplaceAction::SetTokenRail { token }))
            .map(drop)
    }

    /// Hand the admin role to `new_owner`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] unless `caller` is the owner.
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        self.send(Call::new(
            caller,
            MarketplaceAction::TransferOwnership { new_owner },
        ))
        .map(drop)
    }

    /// Buy tickets with native currency. Everything `attached` is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase is not admissible or issuance fails.
    /// Nothing changes in that case.
    pub fn buy_native(
        &self,
        caller: Address,
        attached: Amount,
        event_id: EventId,
        ticket_count: u128,
    ) -> Result<Vec<TicketId>> {
        self.send(Call::paying(
            caller,
            attached,
            MarketplaceAction::BuyNative {
                event_id,
                ticket_count,
            },
        ))
        .map(|receipt| receipt.issued)
    }

    /// Buy tickets with tokens pulled from `caller`.
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase is not admissible, the pull fails, or
    /// issuance fails. Pulled tokens are returned in that case.
    pub fn buy_token(&self, caller: Address, event_id: EventId, ticket_count: u128) -> Result<Vec<TicketId>> {
        self.send(Call::new(
            caller,
            MarketplaceAction::BuyToken {
                event_id,
                ticket_count,
            },
        ))
        .map(|receipt| receipt.issued)
    }

    /// Number of events created so far
    #[must_use]
    pub fn event_count(&self) -> u128 {
        self.store.state(MarketplaceState::event_count)
    }

    /// Snapshot of one event.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::InvalidEventId`] if the event does not exist.
    pub fn event(&self, event_id: EventId) -> Result<EventRecord> {
        self.store
            .state(|state| inventory::get_event(state, event_id).copied())
    }

    /// Current admin principal
    #[must_use]
    pub fn owner(&self) -> Address {
        self.store.state(|state| state.owner)
    }

    /// Current token rail address
    #[must_use]
    pub fn token_rail(&self) -> Address {
        self.store.state(|state| state.token_rail)
    }

    /// Native currency held by the marketplace
    #[must_use]
    pub fn native_balance(&self) -> Amount {
        self.store.state(|state| state.native_balance)
    }

    /// The marketplace's own address
    #[must_use]
    pub fn marketplace_address(&self) -> Address {
        self.store.environment().marketplace_address()
    }

    /// Address of the ticket issuer
    #[must_use]
    pub fn ticket_issuer_address(&self) -> Address {
        self.store.environment().ticket_issuer_address()
    }

    /// Subscribe to notifications of calls committed from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StampedNotification> {
        self.store.subscribe()
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &Store<E> {
        &self.store
    }
}

impl<E> std::fmt::Debug for Marketplace<E>
where
    E: MarketplaceEnvironment + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("store", &self.store)
            .finish()
    }
}
