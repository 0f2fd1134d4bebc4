//! # Ticket Marketplace Core
//!
//! Event inventory and purchase state machine for a ticket marketplace that
//! sells numbered seats on two payment rails (native currency and a fungible
//! token) and mints one collectible per sold ticket.
//!
//! ## Core Concepts
//!
//! - **State**: [`MarketplaceState`], the admin, the token rail and the event inventory
//! - **Action**: [`Call`], a [`MarketplaceAction`] plus the caller and attached native currency
//! - **Reducer**: [`MarketplaceReducer`], validates a call and updates a staged state
//! - **Effect**: external work the call still has to do (pull tokens, issue tickets, notify)
//! - **Environment**: collaborators injected via the [`environment::MarketplaceEnvironment`] trait
//!
//! ## Components
//!
//! | Module | Component |
//! |--------|-----------|
//! | [`inventory`] | Inventory Store |
//! | [`admin`] | Admin Gate |
//! | [`purchase`] | Purchase Engine |
//! | [`issuance`] | Issuance Adapter |
//!
//! The reducer never commits anything by itself. The runtime store runs it on a
//! copy of the state, executes the returned effects, and swaps the copy in only
//! when every step succeeded.
//!
//! ## Example
//!
//! ```ignore
//! use ticket_marketplace_core::*;
//!
//! let reducer = MarketplaceReducer::new();
//! let mut state = MarketplaceState::new(admin, token);
//!
//! let effects = reducer.reduce(
//!     &mut state,
//!     Call::new(admin, MarketplaceAction::CreateEvent {
//!         max_tickets: 10,
//!         price_native: Amount::new(100),
//!         price_token: Amount::new(50),
//!     }),
//!     &env,
//! )?;
//! ```

pub mod action;
pub mod admin;
pub mod collaborators;
pub mod error;
pub mod inventory;
pub mod issuance;
pub mod marketplace;
pub mod notification;
pub mod purchase;
pub mod serde_with;
pub mod types;

// Re-export commonly used types
pub use action::{Call, MarketplaceAction};
pub use chrono::{DateTime, Utc};
pub use collaborators::{CollaboratorResult, TicketIssuer, TokenLedger};
pub use error::{CollaboratorError, MarketplaceError};
pub use marketplace::MarketplaceReducer;
pub use notification::{Notification, StampedNotification};
pub use smallvec::{smallvec, SmallVec};
pub use types::{
    Address, Amount, CallContext, EventId, EventRecord, MarketplaceState, Rail, SeatIndex,
    TicketId,
};

/// Reducer module - the core trait for business logic
pub mod reducer {
    use crate::effect::Effect;
    use smallvec::SmallVec;

    /// Business logic of one call: `(State, Action, Environment) → Result<Effects>`
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The input this reducer processes
    /// - `Environment`: The injected collaborators this reducer needs
    /// - `Error`: Why an action is rejected
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment: ?Sized;

        /// The rejection type
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns the effects still to be executed, in order
        ///
        /// On error the state may have been partly modified. Callers run the
        /// reducer on a staged copy and throw it away on error.
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` if the action is not admissible.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<SmallVec<[Effect; 4]>, Self::Error>;
    }
}

/// Effect module - work a call still has to perform after validation
pub mod effect {
    use crate::notification::Notification;
    use crate::types::{Address, Amount, EventId, SeatIndex};
    use std::ops::Range;

    /// Description of an external step, executed by the runtime in order.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect {
        /// Pull `amount` tokens from `from` to the marketplace
        PullTokens {
            /// Token ledger address
            token: Address,
            /// Buyer
            from: Address,
            /// Total price
            amount: Amount,
        },

        /// Mint one ticket per seat in `seats` to `owner`
        Issue {
            /// Buyer
            owner: Address,
            /// Event the seats belong to
            event_id: EventId,
            /// Allocated seats
            seats: Range<SeatIndex>,
        },

        /// Publish a notification once the call commits
        Notify(Notification),
    }

    impl Effect {
        /// Whether this effect touches an external collaborator
        #[must_use]
        pub const fn is_external(&self) -> bool {
            matches!(self, Self::PullTokens { .. } | Self::Issue { .. })
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external collaborators are abstracted behind traits and injected via
/// the Environment parameter.
pub mod environment {
    use crate::collaborators::{TicketIssuer, TokenLedger};
    use crate::types::Address;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Environment dependencies for the marketplace reducer and store.
    pub trait MarketplaceEnvironment: Send + Sync {
        /// Clock used to timestamp notifications
        fn clock(&self) -> &dyn Clock;

        /// The marketplace's own address (spender and payee on the token rail, minter on issuance)
        fn marketplace_address(&self) -> Address;

        /// Address of the ticket issuer
        fn ticket_issuer_address(&self) -> Address;

        /// Ticket issuer collaborator
        fn ticket_issuer(&self) -> &dyn TicketIssuer;

        /// Token ledger deployed at `token`, if any
        fn token_ledger(&self, token: &Address) -> Option<&dyn TokenLedger>;
    }

    /// Production environment backed by shared collaborator handles.
    #[derive(Clone)]
    pub struct ProductionMarketplaceEnvironment {
        clock: Arc<dyn Clock>,
        marketplace_address: Address,
        ticket_issuer_address: Address,
        ticket_issuer: Arc<dyn TicketIssuer>,
        token_ledgers: HashMap<Address, Arc<dyn TokenLedger>>,
    }

    impl ProductionMarketplaceEnvironment {
        /// Create an environment with no token ledgers registered
        #[must_use]
        pub fn new(
            clock: Arc<dyn Clock>,
            marketplace_address: Address,
            ticket_issuer_address: Address,
            ticket_issuer: Arc<dyn TicketIssuer>,
        ) -> Self {
            Self {
                clock,
                marketplace_address,
                ticket_issuer_address,
                ticket_issuer,
                token_ledgers: HashMap::new(),
            }
        }

        /// Register the ledger deployed at `token`
        #[must_use]
        pub fn with_token_ledger(mut self, token: Address, ledger: Arc<dyn TokenLedger>) -> Self {
            self.token_ledgers.insert(token, ledger);
            self
        }
    }

    impl MarketplaceEnvironment for ProductionMarketplaceEnvironment {
        fn clock(&self) -> &dyn Clock {
            self.clock.as_ref()
        }

        fn marketplace_address(&self) -> Address {
            self.marketplace_address
        }

        fn ticket_issuer_address(&self) -> Address {
            self.ticket_issuer_address
        }

        fn ticket_issuer(&self) -> &dyn TicketIssuer {
            self.ticket_issuer.as_ref()
        }

        fn token_ledger(&self, token: &Address) -> Option<&dyn TokenLedger> {
            let ledger: &dyn TokenLedger = self.token_ledgers.get(token)?.as_ref();
            Some(ledger)
        }
    }

    impl std::fmt::Debug for ProductionMarketplaceEnvironment {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ProductionMarketplaceEnvironment")
                .field("marketplace_address", &self.marketplace_address)
                .field("ticket_issuer_address", &self.ticket_issuer_address)
                .field("token_ledgers", &self.token_ledgers.keys().collect::<Vec<_>>())
                .finish_non_exhaustive()
        }
    }
}
