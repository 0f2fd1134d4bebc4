//! Purchase Engine: admission, payment verification and seat allocation.
//!
//! Both rails share one algorithm. Preconditions are checked in this order
//! and the first failure wins:
//!
//! 1. the event exists (`InvalidEventId`)
//! 2. at least one ticket is requested (`InvalidQuantity`)
//! 3. rail-specific payment verification (`PriceOverflow`, then
//!    `InsufficientPayment` and `BalanceOverflow`, or `InsufficientBalance` /
//!    `InsufficientAllowance`)
//! 4. enough seats remain (`InsufficientInventory`)
//!
//! On the token rail the funds are pulled only after the seats are reserved:
//! the pull is returned as an effect and runs after validation, so no token
//! moves for a purchase the inventory cannot satisfy.

use crate::effect::Effect;
use crate::environment::MarketplaceEnvironment;
use crate::error::{MarketplaceError, Result};
use crate::inventory;
use crate::notification::Notification;
use crate::types::{Address, Amount, CallContext, EventId, MarketplaceState, Rail};
use smallvec::{smallvec, SmallVec};

/// `ticket_count * unit_price`, overflow-checked at 256 bits.
///
/// # Errors
///
/// Returns [`MarketplaceError::PriceOverflow`] if the product does not fit.
pub fn total_price(ticket_count: u128, unit_price: Amount) -> Result<Amount> {
    Amount::new(ticket_count)
        .checked_mul(unit_price)
        .ok_or(MarketplaceError::PriceOverflow {
            ticket_count,
            unit_price,
        })
}

/// Buy `ticket_count` tickets paying with the native currency attached to the call.
///
/// Everything attached is retained, including any amount above the total price.
///
/// # Errors
///
/// See the module docs for the order of checks.
pub fn buy_native(
    state: &mut MarketplaceState,
    context: &CallContext,
    event_id: EventId,
    ticket_count: u128,
) -> Result<SmallVec<[Effect; 4]>> {
    let unit_price = admit(state, event_id, ticket_count)?.price_native;

    let required = total_price(ticket_count, unit_price)?;
    if context.attached < required {
        return Err(MarketplaceError::InsufficientPayment {
            required,
            attached: context.attached,
        });
    }
    let native_balance = state.native_balance.checked_add(context.attached).ok_or(
        MarketplaceError::BalanceOverflow {
            balance: state.native_balance,
            attached: context.attached,
        },
    )?;

    let record = inventory::get_event_mut(state, event_id)?;
    let seats = inventory::allocate_seats(record, ticket_count)?;
    state.native_balance = native_balance;

    tracing::debug!(
        %event_id,
        ticket_count,
        %required,
        attached = %context.attached,
        "Native purchase admitted"
    );

    Ok(smallvec![
        Effect::Issue {
            owner: context.caller,
            event_id,
            seats,
        },
        Effect::Notify(Notification::TicketsBought {
            event_id,
            ticket_count,
            rail: Rail::Native,
        }),
    ])
}

/// Buy `ticket_count` tickets paying with tokens pulled from the caller.
///
/// Balance and allowance are read here; the pull itself is returned as the
/// first effect.
///
/// # Errors
///
/// See the module docs for the order of checks. Additionally returns
/// [`MarketplaceError::TokenRailUnavailable`] if no ledger is deployed at the
/// configured token address or the ledger cannot answer a query.
pub fn buy_token<E>(
    state: &mut MarketplaceState,
    context: &CallContext,
    event_id: EventId,
    ticket_count: u128,
    env: &E,
) -> Result<SmallVec<[Effect; 4]>>
where
    E: MarketplaceEnvironment + ?Sized,
{
    let unit_price = admit(state, event_id, ticket_count)?.price_token;
    let required = total_price(ticket_count, unit_price)?;

    let token = state.token_rail;
    verify_token_funds(env, &token, &context.caller, required)?;

    let record = inventory::get_event_mut(state, event_id)?;
    let seats = inventory::allocate_seats(record, ticket_count)?;

    tracing::debug!(%event_id, ticket_count, %required, %token, "Token purchase admitted");

    Ok(smallvec![
        Effect::PullTokens {
            token,
            from: context.caller,
            amount: required,
        },
        Effect::Issue {
            owner: context.caller,
            event_id,
            seats,
        },
        Effect::Notify(Notification::TicketsBought {
            event_id,
            ticket_count,
            rail: Rail::Token,
        }),
    ])
}

fn admit(
    state: &MarketplaceState,
    event_id: EventId,
    ticket_count: u128,
) -> Result<&crate::types::EventRecord> {
    let record = inventory::get_event(state, event_id)?;
    if ticket_count == 0 {
        return Err(MarketplaceError::InvalidQuantity);
    }
    Ok(record)
}

fn verify_token_funds<E>(env: &E, token: &Address, buyer: &Address, required: Amount) -> Result<()>
where
    E: MarketplaceEnvironment + ?Sized,
{
    let unavailable = |reason: String| MarketplaceError::TokenRailUnavailable {
        token: *token,
        reason,
    };

    let ledger = env
        .token_ledger(token)
        .ok_or_else(|| unavailable("no token ledger deployed at this address".to_string()))?;

    let balance = ledger
        .balance_of(buyer)
        .map_err(|e| unavailable(e.to_string()))?;
    if balance < required {
        return Err(MarketplaceError::InsufficientBalance { required, balance });
    }

    let allowance = ledger
        .allowance(buyer, &env.marketplace_address())
        .map_err(|e| unavailable(e.to_string()))?;
    if allowance < required {
        return Err(MarketplaceError::InsufficientAllowance {
            required,
            allowance,
        });
    }

    Ok(())
}
