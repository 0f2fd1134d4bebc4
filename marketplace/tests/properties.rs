//! Property tests for inventory invariants under arbitrary call sequences

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use proptest::prelude::*;
use ticket_marketplace::Marketplace;
use ticket_marketplace_core::{Amount, EventId, MarketplaceError, SeatIndex, TicketId};
use ticket_marketplace_testing::fixtures::{self, ADMIN, BUYER, MARKETPLACE};
use ticket_marketplace_testing::properties;

proptest! {
    #[test]
    fn sold_counter_is_monotonic_and_bounded(
        capacity in properties::capacity(),
        price_native in properties::price(),
        price_token in properties::price(),
        plan in prop::collection::vec((properties::ticket_count(), any::<bool>()), 0..16),
    ) {
        let harness = fixtures::test_environment();
        harness.ledger.mint(&BUYER, Amount::new(u128::MAX));
        harness.ledger.approve(&BUYER, &MARKETPLACE, Amount::new(u128::MAX));
        let registry = harness.registry.clone();
        let marketplace = Marketplace::new(fixtures::initial_state(), harness.env);
        let event_id = marketplace
            .create_event(ADMIN, capacity, price_native, price_token)
            .unwrap();

        let mut sold = 0u128;
        for (ticket_count, pay_with_tokens) in plan {
            let result = if pay_with_tokens {
                marketplace.buy_token(BUYER, event_id, ticket_count)
            } else {
                let attached = Amount::new(ticket_count) * price_native;
                marketplace.buy_native(BUYER, attached, event_id, ticket_count)
            };

            let now = marketplace.event(event_id).unwrap().next_ticket_to_sell;
            prop_assert!(now >= sold);
            prop_assert!(now <= capacity);

            match result {
                Ok(issued) => {
                    let expected: Vec<TicketId> = (sold..sold + ticket_count)
                        .map(|seat| TicketId::pack(event_id, SeatIndex::new(seat)))
                        .collect();
                    prop_assert_eq!(issued, expected);
                    sold += ticket_count;
                }
                Err(MarketplaceError::InvalidQuantity) => {
                    prop_assert_eq!(ticket_count, 0);
                }
                Err(MarketplaceError::InsufficientInventory { requested, available }) => {
                    prop_assert_eq!(requested, ticket_count);
                    prop_assert_eq!(available, capacity - sold);
                    prop_assert!(ticket_count > capacity - sold);
                }
                Err(other) => {
                    prop_assert!(false, "unexpected rejection: {}", other);
                }
            }
            prop_assert_eq!(now, sold);
        }

        // Exactly one mint per sold seat, in seat order.
        let minted: Vec<TicketId> = registry.mint_log().into_iter().map(|(_, id)| id).collect();
        let expected: Vec<TicketId> = (0..sold)
            .map(|seat| TicketId::pack(event_id, SeatIndex::new(seat)))
            .collect();
        prop_assert_eq!(minted, expected);
    }

    #[test]
    fn capacity_only_grows(
        initial in properties::capacity(),
        requests in prop::collection::vec(0u128..1_000, 1..12),
    ) {
        let marketplace = Marketplace::new(
            fixtures::initial_state(),
            fixtures::test_environment().env,
        );
        let event_id = marketplace
            .create_event(ADMIN, initial, Amount::ONE, Amount::ONE)
            .unwrap();

        let mut current = initial;
        for requested in requests {
            let result = marketplace.set_max_tickets(ADMIN, event_id, requested);
            if requested >= current {
                prop_assert!(result.is_ok());
                current = requested;
            } else {
                prop_assert_eq!(
                    result,
                    Err(MarketplaceError::CapacityDecreaseRejected { current, requested })
                );
            }
            prop_assert_eq!(marketplace.event(event_id).unwrap().max_tickets, current);
        }
    }

    #[test]
    fn events_get_sequential_ids(count in 0usize..8) {
        let marketplace = Marketplace::new(
            fixtures::initial_state(),
            fixtures::test_environment().env,
        );
        for expected in 0..count {
            let event_id = marketplace
                .create_event(ADMIN, 1, Amount::ONE, Amount::ONE)
                .unwrap();
            prop_assert_eq!(event_id, EventId::new(expected as u128));
        }
        prop_assert_eq!(marketplace.event_count(), count as u128);
    }
}
