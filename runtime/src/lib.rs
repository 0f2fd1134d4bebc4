//! # Ticket Marketplace Runtime
//!
//! The [`Store`] executes marketplace calls one at a time, each as a single
//! unit of work:
//!
//! 1. the reducer runs on a staged copy of the state
//! 2. the returned effects run in order (tokens pulled, tickets issued),
//!    each external mutation journaled with its undo step
//! 3. only if every step succeeded is the stage swapped in and the
//!    notifications published; otherwise the journal undoes the external
//!    steps and the stage is dropped
//!
//! Read queries see the last committed state, never a call in progress.
//!
//! ## Example
//!
//! ```ignore
//! let store = Store::new(MarketplaceState::new(admin, token), environment);
//!
//! let receipt = store.send(Call::paying(
//!     buyer,
//!     Amount::new(300),
//!     MarketplaceAction::BuyNative { event_id, ticket_count: 3 },
//! ))?;
//! assert_eq!(receipt.issued.len(), 3);
//! ```

pub mod guard;
pub mod journal;
pub mod metrics;

use guard::ReentrancyGuard;
use journal::{Compensation, Journal};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Instant;
use ticket_marketplace_core::effect::Effect;
use ticket_marketplace_core::environment::MarketplaceEnvironment;
use ticket_marketplace_core::issuance::{self, IssuanceAdapter};
use ticket_marketplace_core::reducer::Reducer;
use ticket_marketplace_core::{
    Call, EventId, MarketplaceError, MarketplaceReducer, MarketplaceState, Notification,
    StampedNotification, TicketId,
};
use tokio::sync::broadcast;

/// Configuration for Store instances
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Capacity of the notification broadcast channel
    pub notification_capacity: usize,
}

impl StoreConfig {
    /// Set the notification channel capacity
    #[must_use]
    pub const fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 64,
        }
    }
}

/// What a committed call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Notifications published for this call, in order
    pub notifications: Vec<StampedNotification>,
    /// Tickets issued by this call, in seat order
    pub issued: Vec<TicketId>,
}

impl Receipt {
    /// Id of the event created by this call, if it created one
    #[must_use]
    pub fn created_event(&self) -> Option<EventId> {
        self.notifications
            .iter()
            .find_map(|stamped| match stamped.notification {
                Notification::EventCreated { event_id, .. } => Some(event_id),
                _ => None,
            })
    }
}

/// The Store - executes calls atomically against the marketplace state
///
/// # Type Parameters
///
/// - `E`: Environment type
pub struct Store<E>
where
    E: MarketplaceEnvironment,
{
    state: RwLock<MarketplaceState>,
    call_lock: Mutex<()>,
    guard: ReentrancyGuard,
    reducer: MarketplaceReducer<E>,
    environment: E,
    notifications: broadcast::Sender<StampedNotification>,
}

impl<E> Store<E>
where
    E: MarketplaceEnvironment,
{
    /// Create a new store with initial state and environment
    #[must_use]
    pub fn new(initial_state: MarketplaceState, environment: E) -> Self {
        Self::with_config(initial_state, environment, StoreConfig::default())
    }

    /// Create a new store with custom configuration
    #[must_use]
    pub fn with_config(initial_state: MarketplaceState, environment: E, config: StoreConfig) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));

        Self {
            state: RwLock::new(initial_state),
            call_lock: Mutex::new(()),
            guard: ReentrancyGuard::new(),
            reducer: MarketplaceReducer::new(),
            environment,
            notifications,
        }
    }

    /// Execute one call to completion.
    ///
    /// Calls from different threads are serialized. A call issued from inside
    /// a collaborator while another call is executing on the same thread is
    /// rejected.
    ///
    /// Reentry is recognised by thread only. A collaborator that hands the
    /// callback to another thread and waits for it deadlocks: that thread
    /// blocks on the call lock held by the call waiting for it.
    ///
    /// # Errors
    ///
    /// Returns the [`MarketplaceError`] that aborted the call. Nothing the call
    /// did is visible afterwards.
    #[tracing::instrument(
        skip(self, call),
        name = "store_send",
        fields(action = call.action.name(), caller = %call.context.caller)
    )]
    pub fn send(&self, call: Call) -> Result<Receipt, MarketplaceError> {
        if self.guard.is_reentrant() {
            tracing::warn!("Rejected reentrant call");
            ::metrics::counter!("marketplace_calls_rejected_total", "reason" => "reentrant").increment(1);
            return Err(MarketplaceError::ReentrantCall);
        }

        let _serialized = self.call_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _entered = self.guard.enter();

        ::metrics::counter!("marketplace_calls_total").increment(1);
        let start = Instant::now();

        let result = self.execute(call);

        ::metrics::histogram!("marketplace_call_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => {
                ::metrics::counter!("marketplace_tickets_issued_total")
                    .increment(receipt.issued.len() as u64);
                tracing::debug!(
                    issued = receipt.issued.len(),
                    notifications = receipt.notifications.len(),
                    "Call committed"
                );
            }
            Err(error) => {
                ::metrics::counter!("marketplace_calls_rejected_total", "reason" => "error").increment(1);
                tracing::warn!(%error, "Call rejected");
            }
        }
        result
    }

    fn execute(&self, call: Call) -> Result<Receipt, MarketplaceError> {
        let mut stage = self.state(|state| state.clone());

        let effects = {
            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();
            self.reducer.reduce(&mut stage, call, &self.environment)?
        };
        tracing::trace!("Reducer completed, returned {} effects", effects.len());

        let mut journal = Journal::new(&self.environment);
        let mut outbox = Vec::new();
        let mut issued = Vec::new();

        for effect in effects {
            self.execute_effect(effect, &mut journal, &mut outbox, &mut issued)?;
        }

        // Every step succeeded: keep the external effects and publish the stage.
        journal.commit();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = stage;

        let occurred_at = self.environment.clock().now();
        let notifications: Vec<StampedNotification> = outbox
            .into_iter()
            .map(|notification| StampedNotification {
                occurred_at,
                notification,
            })
            .collect();
        for stamped in &notifications {
            // No subscribers is fine.
            let _ = self.notifications.send(stamped.clone());
        }

        Ok(Receipt {
            notifications,
            issued,
        })
    }

    fn execute_effect(
        &self,
        effect: Effect,
        journal: &mut Journal<'_, E>,
        outbox: &mut Vec<Notification>,
        issued: &mut Vec<TicketId>,
    ) -> Result<(), MarketplaceError> {
        let me = self.environment.marketplace_address();

        match effect {
            Effect::PullTokens {
                token,
                from,
                amount,
            } => {
                let ledger = self.environment.token_ledger(&token).ok_or_else(|| {
                    MarketplaceError::TokenRailUnavailable {
                        token,
                        reason: "no token ledger deployed at this address".to_string(),
                    }
                })?;
                match ledger.transfer_from(&me, &from, &me, amount) {
                    Ok(true) => {
                        journal.record(Compensation::RefundTokens {
                            token,
                            to: from,
                            amount,
                        });
                        tracing::debug!(%token, %from, %amount, "Tokens pulled");
                    }
                    Ok(false) => {
                        return Err(MarketplaceError::TokenTransferFailed {
                            reason: "token ledger returned false".to_string(),
                        });
                    }
                    Err(e) => {
                        return Err(MarketplaceError::TokenTransferFailed {
                            reason: e.to_string(),
                        });
                    }
                }
            }

            Effect::Issue {
                owner,
                event_id,
                seats,
            } => {
                let adapter = IssuanceAdapter::new(self.environment.ticket_issuer(), me);
                for ticket_id in issuance::ticket_ids(event_id, seats) {
                    adapter.issue(&owner, ticket_id)?;
                    journal.record(Compensation::RevokeTicket { ticket_id });
                    issued.push(ticket_id);
                }
            }

            Effect::Notify(notification) => outbox.push(notification),
        }

        Ok(())
    }

    /// Read from the last committed state
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&MarketplaceState) -> T,
    {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Subscribe to notifications of calls committed from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StampedNotification> {
        self.notifications.subscribe()
    }

    /// The injected environment
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.environment
    }
}

impl<E> std::fmt::Debug for Store<E>
where
    E: MarketplaceEnvironment + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("environment", &self.environment)
            .field("subscribers", &self.notifications.receiver_count())
            .finish_non_exhaustive()
    }
}
