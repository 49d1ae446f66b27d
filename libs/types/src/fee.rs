//! Fee schedule and fee-pool split
//!
//! Each party deposits its declared value plus a fixed total fee:
//! `tx_fee` funds the outbound item transfers for that party's items, and
//! `service_fee` is collected into the pool on completion. The pool is split
//! between the two fee recipients in basis points.

use serde::{Deserialize, Serialize};

use crate::coins::{Coins, BPS_DENOMINATOR};

/// Fixed fee constants, immutable for the lifetime of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Per-party budget for outbound item transfers.
    pub tx_fee: Coins,
    /// Per-party service fee, collected only on completion.
    pub service_fee: Coins,
    /// Value attached to each outbound item transfer.
    pub item_forward_value: Coins,
    /// Share of the pool paid to fee recipient 1, in basis points.
    pub fee_split_bps: u16,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tx_fee: Coins::from_nano(500_000_000),
            service_fee: Coins::from_nano(100_000_000),
            item_forward_value: Coins::from_nano(50_000_000),
            fee_split_bps: 3000,
        }
    }
}

/// Amounts paid to the two fee recipients. Always sums to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub recipient_1: Coins,
    pub recipient_2: Coins,
}

impl FeeSplit {
    pub fn total(&self) -> Option<Coins> {
        self.recipient_1.checked_add(self.recipient_2)
    }
}

impl FeeSchedule {
    /// Fee each party attaches on top of its declared value.
    pub fn total_fee(&self) -> Option<Coins> {
        self.tx_fee.checked_add(self.service_fee)
    }

    /// Minimum deposit for a declared value.
    pub fn required_deposit(&self, declared: Coins) -> Option<Coins> {
        declared.checked_add(self.total_fee()?)
    }

    /// Value consumed forwarding `count` items.
    pub fn forwarding_cost(&self, count: u32) -> Option<Coins> {
        self.item_forward_value.checked_mul(count)
    }

    /// Largest item count one party's `tx_fee` can forward.
    pub fn max_items(&self) -> u32 {
        if self.item_forward_value.is_zero() {
            return u32::MAX;
        }
        let max = self.tx_fee.nano() / self.item_forward_value.nano();
        u32::try_from(max).unwrap_or(u32::MAX)
    }

    /// Combined pool on completion: both parties' service fees.
    pub fn fee_pool(&self) -> Option<Coins> {
        self.service_fee.checked_add(self.service_fee)
    }

    /// Split `pool` by `fee_split_bps`; recipient 2 takes the rounding dust.
    pub fn split(&self, pool: Coins) -> Option<FeeSplit> {
        if self.fee_split_bps as u128 > BPS_DENOMINATOR {
            return None;
        }
        let recipient_1 = pool.bps_share(self.fee_split_bps)?;
        let recipient_2 = pool.checked_sub(recipient_1)?;
        Some(FeeSplit {
            recipient_1,
            recipient_2,
        })
    }
}
