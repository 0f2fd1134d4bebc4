//! Integration tests for Store notification broadcasting
//!
//! Subscribers receive the notifications of committed calls only, in call
//! order, stamped with the environment clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use ticket_marketplace_core::environment::Clock;
use ticket_marketplace_core::{
    Amount, Call, EventId, MarketplaceAction, Notification, Rail, StampedNotification,
};
use ticket_marketplace_runtime::{Store, StoreConfig};
use ticket_marketplace_testing::fixtures::{self, ADMIN, BUYER, MARKETPLACE, TOKEN};
use ticket_marketplace_testing::test_clock;
use tokio::sync::broadcast::error::TryRecvError;

const EVENT: EventId = EventId::new(0);

fn create_event() -> Call {
    Call::new(
        ADMIN,
        MarketplaceAction::CreateEvent {
            max_tickets: 100,
            price_native: Amount::new(10),
            price_token: Amount::new(5),
        },
    )
}

#[tokio::test]
async fn test_subscriber_receives_notifications_in_order() {
    let harness = fixtures::test_environment();
    harness.ledger.mint(&BUYER, Amount::new(100));
    harness.ledger.approve(&BUYER, &MARKETPLACE, Amount::new(100));
    let store = Store::new(fixtures::initial_state(), harness.env);
    let mut rx = store.subscribe();

    store.send(create_event()).unwrap();
    store
        .send(Call::paying(
            BUYER,
            Amount::new(20),
            MarketplaceAction::BuyNative {
                event_id: EVENT,
                ticket_count: 2,
            },
        ))
        .unwrap();
    store
        .send(Call::new(
            BUYER,
            MarketplaceAction::BuyToken {
                event_id: EVENT,
                ticket_count: 3,
            },
        ))
        .unwrap();
    store
        .send(Call::new(
            ADMIN,
            MarketplaceAction::SetPriceToken {
                event_id: EVENT,
                price: Amount::new(6),
            },
        ))
        .unwrap();

    let expected = [
        Notification::EventCreated {
            event_id: EVENT,
            max_tickets: 100,
            price_native: Amount::new(10),
            price_token: Amount::new(5),
        },
        Notification::TicketsBought {
            event_id: EVENT,
            ticket_count: 2,
            rail: Rail::Native,
        },
        Notification::TicketsBought {
            event_id: EVENT,
            ticket_count: 3,
            rail: Rail::Token,
        },
        Notification::PriceUpdated {
            event_id: EVENT,
            price: Amount::new(6),
            rail: Rail::Token,
        },
    ];

    for notification in expected {
        let stamped = rx.recv().await.unwrap();
        assert_eq!(
            stamped,
            StampedNotification {
                occurred_at: test_clock().now(),
                notification,
            }
        );
    }
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_rejected_call_publishes_nothing() {
    let harness = fixtures::test_environment();
    let store = Store::new(fixtures::initial_state(), harness.env);
    store.send(create_event()).unwrap();
    let mut rx = store.subscribe();

    let rejected = store.send(Call::paying(
        BUYER,
        Amount::new(19),
        MarketplaceAction::BuyNative {
            event_id: EVENT,
            ticket_count: 2,
        },
    ));
    assert!(rejected.is_err());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    store
        .send(Call::new(
            ADMIN,
            MarketplaceAction::SetTokenRail { token: BUYER },
        ))
        .unwrap();
    assert_eq!(
        rx.recv().await.unwrap().notification,
        Notification::TokenRailUpdated { token: BUYER }
    );
    assert_ne!(store.state(|s| s.token_rail), TOKEN);
}

#[tokio::test]
async fn test_receipt_matches_broadcast() {
    let harness = fixtures::test_environment();
    let store = Store::new(fixtures::initial_state(), harness.env);
    let mut rx = store.subscribe();

    let receipt = store.send(create_event()).unwrap();
    assert_eq!(receipt.created_event(), Some(EVENT));
    assert_eq!(receipt.notifications.len(), 1);
    assert_eq!(rx.recv().await.unwrap(), receipt.notifications[0]);
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let harness = fixtures::test_environment();
    let store = Store::with_config(
        fixtures::initial_state(),
        harness.env,
        StoreConfig::default().with_notification_capacity(4),
    );
    let mut first = store.subscribe();
    let mut second = store.subscribe();

    store
        .send(Call::new(
            ADMIN,
            MarketplaceAction::TransferOwnership { new_owner: BUYER },
        ))
        .unwrap();

    let expected = Notification::OwnershipTransferred {
        previous_owner: ADMIN,
        new_owner: BUYER,
    };
    assert_eq!(first.recv().await.unwrap().notification, expected);
    assert_eq!(second.recv().await.unwrap().notification, expected);
    assert_eq!(store.state(|s| s.owner), BUYER);
}

#[test]
fn test_no_subscribers_is_fine() {
    let harness = fixtures::test_environment();
    let store = Store::new(fixtures::initial_state(), harness.env);
    assert!(store.send(create_event()).is_ok());
}
