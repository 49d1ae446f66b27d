//! Offer contract events
//!
//! Immutable records appended by each committed operation. Rejected
//! operations emit nothing.

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::coins::Coins;
use types::fee::FeeSplit;

use crate::security::Role;

/// Offer deployed with the first party's deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDeployed {
    pub contract: Address,
    pub first_party: Address,
    pub first_value: Coins,
    pub item_count: u32,
    pub deposit: Coins,
    pub deployed_at: u64,
}

/// Plain value transfer credited to the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToppedUp {
    pub sender: Address,
    pub amount: Coins,
    pub balance: Coins,
}

/// Second party accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAccepted {
    pub second_party: Address,
    pub second_value: Coins,
    pub item_count: u32,
    pub deposit: Coins,
    pub accepted_at: u64,
}

/// Swap completed by the first party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferConfirmed {
    pub fee_split: FeeSplit,
    pub first_payout: Coins,
    pub second_payout: Coins,
    pub items_transferred: u32,
    pub confirmed_at: u64,
}

/// Offer canceled; everything returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCanceled {
    pub canceled_by: Address,
    pub role: Role,
    pub first_refund: Coins,
    pub second_refund: Coins,
    pub items_returned: u32,
    pub canceled_at: u64,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    OfferDeployed(OfferDeployed),
    ToppedUp(ToppedUp),
    OfferAccepted(OfferAccepted),
    OfferConfirmed(OfferConfirmed),
    OfferCanceled(OfferCanceled),
}
