//! Offer lifecycle types
//!
//! Status codes are persisted as a 16-bit field and returned by `get_status`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offer status.
///
/// ```text
/// WAIT_SECOND ──accept──► WAIT_CONFIRM ──confirm──► OFFER_COMPLETED
///      │                       │
///      └───────cancel──────────┴──────► OFFER_CANCELED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    OfferCanceled,
    WaitSecond,
    WaitConfirm,
    OfferCompleted,
}

impl OfferStatus {
    pub const fn code(&self) -> u16 {
        match self {
            OfferStatus::OfferCanceled => 0,
            OfferStatus::WaitSecond => 1,
            OfferStatus::WaitConfirm => 2,
            OfferStatus::OfferCompleted => 3,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(OfferStatus::OfferCanceled),
            1 => Some(OfferStatus::WaitSecond),
            2 => Some(OfferStatus::WaitConfirm),
            3 => Some(OfferStatus::OfferCompleted),
            _ => None,
        }
    }

    /// Terminal statuses accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OfferStatus::OfferCanceled | OfferStatus::OfferCompleted)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferStatus::OfferCanceled => write!(f, "OFFER_CANCELED"),
            OfferStatus::WaitSecond => write!(f, "WAIT_SECOND"),
            OfferStatus::WaitConfirm => write!(f, "WAIT_CONFIRM"),
            OfferStatus::OfferCompleted => write!(f, "OFFER_COMPLETED"),
        }
    }
}

/// Which party's collection an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The offer creator.
    First,
    /// The accepting counterparty.
    Second,
}

impl Side {
    pub const fn other(&self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}
