//! # Ticket Marketplace Testing
//!
//! Testing utilities for the ticket marketplace.
//!
//! This crate provides:
//! - Deterministic clock and in-memory collaborators (token ledger, ticket registry)
//! - Fixtures wiring them into a marketplace environment
//! - Property-based testing strategies
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use ticket_marketplace_testing::fixtures::{self, ADMIN, BUYER};
//!
//! let harness = fixtures::test_environment();
//! harness.ledger.mint(&BUYER, Amount::new(1_000));
//! let store = Store::new(fixtures::initial_state(), harness.env);
//! ```

use chrono::{DateTime, Utc};
use ticket_marketplace_core::environment::Clock;

pub mod issuer_mocks;
pub mod ledger_mocks;
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    pub use crate::issuer_mocks::{ReentrantTicketIssuer, TicketRegistry};
    pub use crate::ledger_mocks::{
        InMemoryTokenLedger, LedgerCallback, ReentrantTokenLedger, TransferBehavior,
    };

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_marketplace_testing::mocks::FixedClock;
    /// use ticket_marketplace_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Well-known addresses and a wired test environment.
pub mod fixtures {
    use crate::mocks::{
        InMemoryTokenLedger, ReentrantTicketIssuer, ReentrantTokenLedger, TicketRegistry,
        test_clock,
    };
    use std::sync::Arc;
    use ticket_marketplace_core::environment::ProductionMarketplaceEnvironment;
    use ticket_marketplace_core::{Address, MarketplaceState, TicketIssuer, TokenLedger};

    /// Marketplace owner at deployment
    pub const ADMIN: Address = Address::repeat_byte(0xAD);
    /// A buyer
    pub const BUYER: Address = Address::repeat_byte(0xB1);
    /// A second buyer
    pub const OTHER_BUYER: Address = Address::repeat_byte(0xB2);
    /// The marketplace's own address
    pub const MARKETPLACE: Address = Address::repeat_byte(0x3A);
    /// The token ledger's address
    pub const TOKEN: Address = Address::repeat_byte(0x70);
    /// The ticket issuer's address
    pub const ISSUER: Address = Address::repeat_byte(0x1C);

    /// Environment plus handles on its collaborators.
    #[derive(Debug)]
    pub struct TestHarness {
        /// Environment to hand to the store
        pub env: ProductionMarketplaceEnvironment,
        /// Token ledger registered at [`TOKEN`]
        pub ledger: Arc<InMemoryTokenLedger>,
        /// Ticket registry minting for [`MARKETPLACE`]
        pub registry: Arc<TicketRegistry>,
    }

    /// Fresh state owned by [`ADMIN`] with the rail at [`TOKEN`]
    #[must_use]
    pub const fn initial_state() -> MarketplaceState {
        MarketplaceState::new(ADMIN, TOKEN)
    }

    /// Environment with a well-behaved ledger and registry
    #[must_use]
    pub fn test_environment() -> TestHarness {
        let registry = Arc::new(TicketRegistry::new(MARKETPLACE));
        let ledger = Arc::new(InMemoryTokenLedger::new());
        build(registry.clone(), registry, ledger.clone(), ledger)
    }

    /// Environment whose issuer is a [`ReentrantTicketIssuer`] around a registry
    #[must_use]
    pub fn reentrant_environment() -> (TestHarness, Arc<ReentrantTicketIssuer>) {
        let registry = Arc::new(TicketRegistry::new(MARKETPLACE));
        let issuer = Arc::new(ReentrantTicketIssuer::new(registry.clone()));
        let ledger = Arc::new(InMemoryTokenLedger::new());
        (build(issuer.clone(), registry, ledger.clone(), ledger), issuer)
    }

    /// Environment whose token ledger at [`TOKEN`] is a [`ReentrantTokenLedger`].
    ///
    /// `harness.ledger` is the wrapped ledger, for funding buyers.
    #[must_use]
    pub fn reentrant_ledger_environment() -> (TestHarness, Arc<ReentrantTokenLedger>) {
        let registry = Arc::new(TicketRegistry::new(MARKETPLACE));
        let ledger = Arc::new(InMemoryTokenLedger::new());
        let reentrant = Arc::new(ReentrantTokenLedger::new(ledger.clone()));
        (
            build(registry.clone(), registry, reentrant.clone(), ledger),
            reentrant,
        )
    }

    fn build(
        issuer: Arc<dyn TicketIssuer>,
        registry: Arc<TicketRegistry>,
        rail: Arc<dyn TokenLedger>,
        ledger: Arc<InMemoryTokenLedger>,
    ) -> TestHarness {
        let env = ProductionMarketplaceEnvironment::new(
            Arc::new(test_clock()),
            MARKETPLACE,
            ISSUER,
            issuer,
        )
        .with_token_ledger(TOKEN, rail);

        TestHarness {
            env,
            ledger,
            registry,
        }
    }
}

/// Property-based testing strategies for marketplace values.
pub mod properties {
    use proptest::prelude::*;
    use ticket_marketplace_core::{Address, Amount};

    /// Any non-zero address
    pub fn address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>()
            .prop_filter("zero address", |bytes| bytes.iter().any(|b| *b != 0))
            .prop_map(Address::new)
    }

    /// Prices small enough that any realistic purchase total fits
    pub fn price() -> impl Strategy<Value = Amount> {
        (0u64..1_000_000).prop_map(|p| Amount::new(u128::from(p)))
    }

    /// Event capacities
    pub fn capacity() -> impl Strategy<Value = u128> {
        0u128..500
    }

    /// Ticket counts for a single purchase, zero included
    pub fn ticket_count() -> impl Strategy<Value = u128> {
        0u128..64
    }

    /// A sequence of purchase sizes against one event
    pub fn purchase_plan() -> impl Strategy<Value = Vec<u128>> {
        prop::collection::vec(ticket_count(), 0..16)
    }
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Respects `RUST_LOG`, defaulting to `warn`. Later calls are no-ops.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use issuer_mocks::{ReentrantTicketIssuer, TicketRegistry};
pub use ledger_mocks::{
    InMemoryTokenLedger, LedgerCallback, ReentrantTokenLedger, TransferBehavior,
};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
