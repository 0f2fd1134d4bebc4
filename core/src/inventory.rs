//! Inventory Store: the append-only, index-addressed collection of events.
//!
//! Bounds checking and storage only. Authorization happens in the Admin Gate,
//! admission of purchases in the Purchase Engine.

use crate::error::{MarketplaceError, Result};
use crate::types::{Amount, EventId, EventRecord, MarketplaceState, Rail, SeatIndex};
use std::ops::Range;

/// Append a new event with nothing sold. Zero capacity and zero prices are legal.
pub fn create_event(
    state: &mut MarketplaceState,
    max_tickets: u128,
    price_native: Amount,
    price_token: Amount,
) -> EventId {
    let event_id = EventId::new(state.event_count());
    state
        .events
        .push(EventRecord::new(max_tickets, price_native, price_token));
    event_id
}

/// Look up an event.
///
/// # Errors
///
/// Returns [`MarketplaceError::InvalidEventId`] if `event_id` was never created.
pub fn get_event(state: &MarketplaceState, event_id: EventId) -> Result<&EventRecord> {
    usize::try_from(event_id.get())
        .ok()
        .and_then(|index| state.events.get(index))
        .ok_or_else(|| invalid_event(state, event_id))
}

/// Look up an event for mutation.
///
/// # Errors
///
/// Returns [`MarketplaceError::InvalidEventId`] if `event_id` was never created.
pub fn get_event_mut(state: &mut MarketplaceState, event_id: EventId) -> Result<&mut EventRecord> {
    let error = invalid_event(state, event_id);
    usize::try_from(event_id.get())
        .ok()
        .and_then(|index| state.events.get_mut(index))
        .ok_or(error)
}

/// Raise an event's capacity. Setting the current value again is accepted.
///
/// # Errors
///
/// Returns [`MarketplaceError::InvalidEventId`] for an unknown event and
/// [`MarketplaceError::CapacityDecreaseRejected`] if `new_max` is below the
/// current capacity.
pub fn set_max_tickets(state: &mut MarketplaceState, event_id: EventId, new_max: u128) -> Result<()> {
    let record = get_event_mut(state, event_id)?;
    if new_max < record.max_tickets {
        return Err(MarketplaceError::CapacityDecreaseRejected {
            current: record.max_tickets,
            requested: new_max,
        });
    }
    record.max_tickets = new_max;
    Ok(())
}

/// Set an event's unit price on one rail. Any value, zero included, is accepted.
///
/// # Errors
///
/// Returns [`MarketplaceError::InvalidEventId`] for an unknown event.
pub fn set_price(
    state: &mut MarketplaceState,
    event_id: EventId,
    rail: Rail,
    price: Amount,
) -> Result<()> {
    let record = get_event_mut(state, event_id)?;
    match rail {
        Rail::Native => record.price_native = price,
        Rail::Token => record.price_token = price,
    }
    Ok(())
}

/// Allocate `count` consecutive seats and advance the sold counter.
///
/// Returns the allocated seat range.
///
/// # Errors
///
/// Returns [`MarketplaceError::InsufficientInventory`] if fewer than `count`
/// seats remain. The record is untouched on error.
pub fn allocate_seats(record: &mut EventRecord, count: u128) -> Result<Range<SeatIndex>> {
    let available = record.remaining();
    if count > available {
        return Err(MarketplaceError::InsufficientInventory {
            requested: count,
            available,
        });
    }
    let start = record.next_ticket_to_sell;
    // count <= max_tickets - start, so start + count <= max_tickets
    let end = start + count;
    record.next_ticket_to_sell = end;
    Ok(SeatIndex::new(start)..SeatIndex::new(end))
}

fn invalid_event(state: &MarketplaceState, event_id: EventId) -> MarketplaceError {
    MarketplaceError::InvalidEventId {
        event_id,
        event_count: state.event_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn state() -> MarketplaceState {
        MarketplaceState::new(Address::repeat_byte(1), Address::repeat_byte(2))
    }

    #[test]
    fn test_create_event_assigns_sequential_ids() {
        let mut state = state();
        let first = create_event(&mut state, 10, Amount::new(100), Amount::new(50));
        let second = create_event(&mut state, 0, Amount::ZERO, Amount::ZERO);

        assert_eq!(first, EventId::new(0));
        assert_eq!(second, EventId::new(1));
        assert_eq!(state.event_count(), 2);
        assert_eq!(get_event(&state, first).unwrap().next_ticket_to_sell, 0);
        assert_eq!(get_event(&state, second).unwrap().max_tickets, 0);
    }

    #[test]
    fn test_get_event_out_of_range() {
        let mut state = state();
        create_event(&mut state, 1, Amount::ZERO, Amount::ZERO);

        assert_eq!(
            get_event(&state, EventId::new(1)),
            Err(MarketplaceError::InvalidEventId {
                event_id: EventId::new(1),
                event_count: 1,
            })
        );
        assert!(get_event(&state, EventId::new(u128::MAX)).is_err());
    }

    #[test]
    fn test_set_max_tickets_is_monotonic() {
        let mut state = state();
        let id = create_event(&mut state, 10, Amount::ZERO, Amount::ZERO);

        assert!(set_max_tickets(&mut state, id, 10).is_ok());
        assert!(set_max_tickets(&mut state, id, 20).is_ok());
        assert_eq!(
            set_max_tickets(&mut state, id, 19),
            Err(MarketplaceError::CapacityDecreaseRejected {
                current: 20,
                requested: 19,
            })
        );
        assert_eq!(get_event(&state, id).unwrap().max_tickets, 20);
    }

    #[test]
    fn test_set_price_per_rail() {
        let mut state = state();
        let id = create_event(&mut state, 10, Amount::new(100), Amount::new(50));

        set_price(&mut state, id, Rail::Native, Amount::ZERO).unwrap();
        set_price(&mut state, id, Rail::Token, Amount::new(7)).unwrap();

        let record = get_event(&state, id).unwrap();
        assert_eq!(record.price_native, Amount::ZERO);
        assert_eq!(record.price_token, Amount::new(7));
        assert!(set_price(&mut state, EventId::new(5), Rail::Token, Amount::ONE).is_err());
    }

    #[test]
    fn test_allocate_seats_exact_remaining() {
        let mut record = EventRecord::new(5, Amount::ZERO, Amount::ZERO);

        let seats = allocate_seats(&mut record, 2).unwrap();
        assert_eq!(seats, SeatIndex::new(0)..SeatIndex::new(2));

        let seats = allocate_seats(&mut record, 3).unwrap();
        assert_eq!(seats, SeatIndex::new(2)..SeatIndex::new(5));
        assert_eq!(record.remaining(), 0);

        assert_eq!(
            allocate_seats(&mut record, 1),
            Err(MarketplaceError::InsufficientInventory {
                requested: 1,
                available: 0,
            })
        );
        assert_eq!(record.next_ticket_to_sell, 5);
    }

    #[test]
    fn test_allocate_seats_at_width_limit() {
        let mut record = EventRecord::new(u128::MAX, Amount::ZERO, Amount::ZERO);
        record.next_ticket_to_sell = u128::MAX - 1;

        let seats = allocate_seats(&mut record, 1).unwrap();
        assert_eq!(seats.end, SeatIndex::new(u128::MAX));
        assert!(allocate_seats(&mut record, 1).is_err());
    }
}
