//! Marketplace demo.
//!
//! Wires the marketplace to in-memory collaborators, runs a short sale on
//! both payment rails, and prints every notification as JSON.

use anyhow::Context;
use std::sync::Arc;
use ticket_marketplace::telemetry::init_tracing;
use ticket_marketplace::{Marketplace, MarketplaceConfig};
use ticket_marketplace_core::environment::{ProductionMarketplaceEnvironment, SystemClock};
use ticket_marketplace_core::{Address, Amount};
use ticket_marketplace_runtime::metrics::MetricsServer;
use ticket_marketplace_testing::{InMemoryTokenLedger, TicketRegistry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env file is the common case.
        if !e.not_found() {
            return Err(e).context("failed to load .env");
        }
    }

    let config = MarketplaceConfig::from_env().context("invalid marketplace configuration")?;
    init_tracing(&config.log_filter);
    info!(
        owner = %config.owner,
        marketplace = %config.marketplace_address,
        token = %config.token_address,
        "Configuration loaded"
    );

    let mut metrics = config.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics.as_mut() {
        server.start().context("failed to start metrics")?;
    }

    let ledger = Arc::new(InMemoryTokenLedger::new());
    let registry = Arc::new(TicketRegistry::new(config.marketplace_address));
    let environment = ProductionMarketplaceEnvironment::new(
        Arc::new(SystemClock),
        config.marketplace_address,
        config.issuer_address,
        registry.clone(),
    )
    .with_token_ledger(config.token_address, ledger.clone());

    let marketplace = Marketplace::from_config(&config, environment);
    let mut notifications = marketplace.subscribe();

    let admin = config.owner;
    let buyer = Address::repeat_byte(0xB1);
    ledger.mint(&buyer, Amount::new(1_000));
    ledger.approve(&buyer, &marketplace.marketplace_address(), Amount::new(1_000));

    let event_id = marketplace.create_event(admin, 100, Amount::new(10), Amount::new(5))?;
    let native = marketplace.buy_native(buyer, Amount::new(100), event_id, 10)?;
    let token = marketplace.buy_token(buyer, event_id, 10)?;
    info!(native = native.len(), token = token.len(), "Tickets bought");

    if let Err(error) = marketplace.buy_native(buyer, Amount::new(1), event_id, 1) {
        warn!(%error, "Underpaid purchase rejected as expected");
    }

    let record = marketplace.event(event_id)?;
    info!(
        %event_id,
        sold = record.next_ticket_to_sell,
        remaining = record.remaining(),
        native_balance = %marketplace.native_balance(),
        buyer_tokens = %ledger.balance(&buyer),
        tickets_held = registry.balance_of(&buyer),
        "Sale summary"
    );

    while let Ok(stamped) = notifications.try_recv() {
        println!("{}", serde_json::to_string(&stamped)?);
    }

    if let Some(rendered) = metrics.as_ref().and_then(MetricsServer::render) {
        println!("{rendered}");
    }

    Ok(())
}
