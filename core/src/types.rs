//! Domain types for the ticket marketplace.
//!
//! Value objects (addresses, identifiers, amounts) and the authoritative
//! inventory state owned by the Inventory Store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Monetary amount on either payment rail.
///
/// 256 bits wide; every price multiplication is overflow-checked at this width.
pub type Amount = ethnum::U256;

// ============================================================================
// Identifiers
// ============================================================================

/// A 20-byte account principal (buyer, admin, contract or token address).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Never a valid ticket owner.
    pub const ZERO: Self = Self([0; 20]);

    /// Create an address from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an address with every byte set to `byte`
    #[must_use]
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Get the raw bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is [`Address::ZERO`]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing an [`Address`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// Not valid hexadecimal
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),
    /// Wrong number of bytes
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a ticketed event. It is the event's index in the inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(#[serde(with = "crate::serde_with::decimal_u128")] u128);

impl EventId {
    /// Create an `EventId` from its index
    #[must_use]
    pub const fn new(index: u128) -> Self {
        Self(index)
    }

    /// Get the inner index
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a seat within one event, allocated in sale order from 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatIndex(#[serde(with = "crate::serde_with::decimal_u128")] u128);

impl SeatIndex {
    /// Create a `SeatIndex`
    #[must_use]
    pub const fn new(index: u128) -> Self {
        Self(index)
    }

    /// Get the inner index
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SeatIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one issued ticket: `(event_id, seat)` packed into 256 bits.
///
/// Layout: bits 255..128 hold the event id, bits 127..0 hold the seat index.
/// Both fields are exactly 128 bits wide, so every `(EventId, SeatIndex)` pair
/// maps to a distinct `TicketId` and [`TicketId::unpack`] inverts [`TicketId::pack`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(Amount);

impl TicketId {
    /// Width in bits of the seat field.
    pub const SEAT_BITS: u32 = 128;

    /// Pack an event id and seat index into a ticket id
    #[must_use]
    pub const fn pack(event_id: EventId, seat: SeatIndex) -> Self {
        Self(Amount::from_words(event_id.get(), seat.get()))
    }

    /// Split a ticket id back into its event id and seat index
    #[must_use]
    pub const fn unpack(self) -> (EventId, SeatIndex) {
        let (high, low) = self.0.into_words();
        (EventId::new(high), SeatIndex::new(low))
    }

    /// Event this ticket belongs to
    #[must_use]
    pub const fn event_id(self) -> EventId {
        self.unpack().0
    }

    /// Seat index within the event
    #[must_use]
    pub const fn seat(self) -> SeatIndex {
        self.unpack().1
    }

    /// The raw 256-bit value handed to the issuance collaborator
    #[must_use]
    pub const fn as_u256(self) -> Amount {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Payment rails
// ============================================================================

/// Payment rail a price applies to or a purchase settled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rail {
    /// Native currency attached to the call
    #[serde(rename = "ETH")]
    Native,
    /// Fungible token pulled through the token ledger
    #[serde(rename = "ERC20")]
    Token,
}

impl Rail {
    /// Label used in notifications
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Native => "ETH",
            Self::Token => "ERC20",
        }
    }
}

impl fmt::Display for Rail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// One ticketed occasion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Next unallocated seat. Never decreases, never exceeds `max_tickets`.
    pub next_ticket_to_sell: u128,
    /// Capacity ceiling. Only ever raised.
    pub max_tickets: u128,
    /// Unit price on the native rail
    pub price_native: Amount,
    /// Unit price on the token rail
    pub price_token: Amount,
}

impl EventRecord {
    /// Create a record with nothing sold
    #[must_use]
    pub const fn new(max_tickets: u128, price_native: Amount, price_token: Amount) -> Self {
        Self {
            next_ticket_to_sell: 0,
            max_tickets,
            price_native,
            price_token,
        }
    }

    /// Seats still available
    #[must_use]
    pub const fn remaining(&self) -> u128 {
        self.max_tickets.saturating_sub(self.next_ticket_to_sell)
    }

    /// Unit price on the given rail
    #[must_use]
    pub const fn price(&self, rail: Rail) -> Amount {
        match rail {
            Rail::Native => self.price_native,
            Rail::Token => self.price_token,
        }
    }
}

/// Authoritative marketplace state.
///
/// The event counter is `events.len()`; ids are indices and are never reused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceState {
    /// The single admin principal
    pub owner: Address,
    /// Address of the token used on the token rail
    pub token_rail: Address,
    /// Append-only event inventory
    pub events: Vec<EventRecord>,
    /// Native currency retained from purchases, overpayments included
    pub native_balance: Amount,
}

impl MarketplaceState {
    /// Create an empty marketplace administered by `owner`
    #[must_use]
    pub const fn new(owner: Address, token_rail: Address) -> Self {
        Self {
            owner,
            token_rail,
            events: Vec::new(),
            native_balance: Amount::ZERO,
        }
    }

    /// Number of events created so far
    #[must_use]
    pub fn event_count(&self) -> u128 {
        self.events.len() as u128
    }
}

/// Who is calling and how much native currency the call carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Calling principal
    pub caller: Address,
    /// Native currency attached to the call
    pub attached: Amount,
}

impl CallContext {
    /// A call carrying no native currency
    #[must_use]
    pub const fn new(caller: Address) -> Self {
        Self {
            caller,
            attached: Amount::ZERO,
        }
    }

    /// A call carrying `attached` native currency
    #[must_use]
    pub const fn paying(caller: Address, attached: Amount) -> Self {
        Self { caller, attached }
    }
}
