//! The marketplace reducer: routes each call through the Admin Gate, the
//! Inventory Store or the Purchase Engine.

use crate::action::{Call, MarketplaceAction};
use crate::admin;
use crate::effect::Effect;
use crate::environment::MarketplaceEnvironment;
use crate::error::MarketplaceError;
use crate::inventory;
use crate::notification::Notification;
use crate::purchase;
use crate::reducer::Reducer;
use crate::types::{MarketplaceState, Rail};
use smallvec::{smallvec, SmallVec};

/// Marketplace reducer
///
/// Generic over the environment so production wiring and test doubles share
/// the same business logic.
#[derive(Debug, Clone, Copy)]
pub struct MarketplaceReducer<E: ?Sized> {
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E: ?Sized> MarketplaceReducer<E> {
    /// Create a new marketplace reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E: ?Sized> Default for MarketplaceReducer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: MarketplaceEnvironment + ?Sized> Reducer for MarketplaceReducer<E> {
    type State = MarketplaceState;
    type Action = Call;
    type Environment = E;
    type Error = MarketplaceError;

    fn reduce(
        &self,
        state: &mut Self::State,
        call: Self::Action,
        env: &Self::Environment,
    ) -> Result<SmallVec<[Effect; 4]>, Self::Error> {
        let Call { context, action } = call;

        if !action.is_payable() && context.attached > crate::types::Amount::ZERO {
            return Err(MarketplaceError::UnexpectedPayment {
                attached: context.attached,
            });
        }
        if action.is_admin_only() {
            admin::authorize(state, &context.caller)?;
        }

        match action {
            MarketplaceAction::CreateEvent {
                max_tickets,
                price_native,
                price_token,
            } => {
                let event_id =
                    inventory::create_event(state, max_tickets, price_native, price_token);
                tracing::info!(%event_id, max_tickets, "Event created");
                Ok(smallvec![Effect::Notify(Notification::EventCreated {
                    event_id,
                    max_tickets,
                    price_native,
                    price_token,
                })])
            }

            MarketplaceAction::SetMaxTickets { event_id, new_max } => {
                inventory::set_max_tickets(state, event_id, new_max)?;
                Ok(smallvec![Effect::Notify(Notification::MaxTicketsUpdated {
                    event_id,
                    max_tickets: new_max,
                })])
            }

            MarketplaceAction::SetPriceNative { event_id, price } => {
                set_price(state, event_id, Rail::Native, price)
            }

            MarketplaceAction::SetPriceToken { event_id, price } => {
                set_price(state, event_id, Rail::Token, price)
            }

            MarketplaceAction::SetTokenRail { token } => {
                admin::set_token_rail(state, token);
                Ok(smallvec![Effect::Notify(Notification::TokenRailUpdated { token })])
            }

            MarketplaceAction::TransferOwnership { new_owner } => {
                let previous_owner = admin::transfer_ownership(state, new_owner);
                Ok(smallvec![Effect::Notify(Notification::OwnershipTransferred {
                    previous_owner,
                    new_owner,
                })])
            }

            MarketplaceAction::BuyNative {
                event_id,
                ticket_count,
            } => purchase::buy_native(state, &context, event_id, ticket_count),

            MarketplaceAction::BuyToken {
                event_id,
                ticket_count,
            } => purchase::buy_token(state, &context, event_id, ticket_count, env),
        }
    }
}

fn set_price(
    state: &mut MarketplaceState,
    event_id: crate::types::EventId,
    rail: Rail,
    price: crate::types::Amount,
) -> Result<SmallVec<[Effect; 4]>, MarketplaceError> {
    inventory::set_price(state, event_id, rail, price)?;
    Ok(smallvec![Effect::Notify(Notification::PriceUpdated {
        event_id,
        price,
        rail,
    })])
}
