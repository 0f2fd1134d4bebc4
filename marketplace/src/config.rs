//! Configuration management for the marketplace application.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;
use ticket_marketplace_core::Address;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,ticket_marketplace=debug,ticket_marketplace_runtime=debug";

/// A malformed environment value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is not a `0x`-prefixed 20-byte hex address
    #[error("{var} is not a valid address: {value}")]
    InvalidAddress {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
    /// Value is not a valid number or socket address
    #[error("{var} is not valid: {value}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Owner at deployment (`MARKETPLACE_OWNER`)
    pub owner: Address,
    /// The marketplace's own address (`MARKETPLACE_ADDRESS`)
    pub marketplace_address: Address,
    /// Initial token rail (`MARKETPLACE_TOKEN_ADDRESS`)
    pub token_address: Address,
    /// Ticket issuer (`MARKETPLACE_ISSUER_ADDRESS`)
    pub issuer_address: Address,
    /// Notification channel capacity (`MARKETPLACE_NOTIFICATION_CAPACITY`)
    pub notification_capacity: usize,
    /// Where Prometheus metrics are served, if anywhere (`METRICS_ADDR`)
    pub metrics_addr: Option<SocketAddr>,
    /// Tracing filter (`RUST_LOG`)
    pub log_filter: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            owner: Address::repeat_byte(0x01),
            marketplace_address: Address::repeat_byte(0x02),
            token_address: Address::repeat_byte(0x03),
            issuer_address: Address::repeat_byte(0x04),
            notification_capacity: 64,
            metrics_addr: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl MarketplaceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to a malformed value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let address = |var: &'static str, default: Address| -> Result<Address, ConfigError> {
            lookup(var).map_or(Ok(default), |value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidAddress { var, value })
            })
        };

        let notification_capacity = match lookup("MARKETPLACE_NOTIFICATION_CAPACITY") {
            None => defaults.notification_capacity,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "MARKETPLACE_NOTIFICATION_CAPACITY",
                        value,
                    });
                }
            },
        };

        let metrics_addr = lookup("METRICS_ADDR")
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "METRICS_ADDR",
                    value,
                })
            })
            .transpose()?;

        Ok(Self {
            owner: address("MARKETPLACE_OWNER", defaults.owner)?,
            marketplace_address: address("MARKETPLACE_ADDRESS", defaults.marketplace_address)?,
            token_address: address("MARKETPLACE_TOKEN_ADDRESS", defaults.token_address)?,
            issuer_address: address("MARKETPLACE_ISSUER_ADDRESS", defaults.issuer_address)?,
            notification_capacity,
            metrics_addr,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }
}
