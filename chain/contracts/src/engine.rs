//! Deposit/Withdrawal Engine: value accounting and outbound fan-out
//!
//! Pure functions over an `Offer` snapshot and the contract balance. Nothing
//! here mutates state; the dispatcher commits a `Settlement` only after it
//! has been computed in full.
//!
//! # Value Flow
//! ```text
//! deposit(party)   = declared + tx_fee + service_fee   (minimum)
//! item transfer    = item_forward_value each, excess returned to new owner
//! confirm          fee pool = 2 * service_fee, split by fee_split_bps
//!                  second party <- first_value + tx_fee - n2 * forward
//!                  first party  <- remaining balance
//! cancel           second party <- second_value + tx_fee + service_fee - n2 * forward
//!                  first party  <- remaining balance
//! ```
//! The first party always takes the remainder, so overpayment and top-ups
//! are never stranded and the balance is zero after settlement.

use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;
use types::fee::{FeeSchedule, FeeSplit};
use types::offer::Side;

use crate::errors::CellError;
use crate::items::ItemList;
use crate::message::{NftTransfer, OutboundMessage, Purpose};
use crate::storage::Offer;

/// Outbound messages and totals for one terminal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub messages: Vec<OutboundMessage>,
    /// Paid to the fee recipients; `None` on cancellation.
    pub fee_split: Option<FeeSplit>,
    pub first_payout: Coins,
    pub second_payout: Coins,
    pub total_out: Coins,
}

impl Settlement {
    pub fn item_transfer_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_item_transfer()).count()
    }
}

/// Reject `attached` below `declared + total_fee`.
pub fn check_deposit(fees: &FeeSchedule, declared: Coins, attached: Coins) -> Result<(), OfferError> {
    let required = fees
        .required_deposit(declared)
        .ok_or(OfferError::Overflow)?;
    if attached < required {
        return Err(OfferError::InvalidAmount { required, attached });
    }
    Ok(())
}

/// Reject a side whose items cannot be forwarded within one `tx_fee`.
pub fn check_item_budget(fees: &FeeSchedule, items: &ItemList) -> Result<(), OfferError> {
    let max = fees.max_items();
    if items.len() > max {
        return Err(OfferError::TooManyItems {
            count: items.len(),
            max,
        });
    }
    Ok(())
}

/// One transfer instruction per item of `side`, each moving it to `new_owner`.
pub fn item_transfers(
    items: &ItemList,
    side: Side,
    new_owner: Address,
    fees: &FeeSchedule,
) -> Result<Vec<OutboundMessage>, CellError> {
    items
        .iter()
        .map(|(position, item)| {
            let mut transfer = NftTransfer::new(new_owner);
            transfer.response_destination = Some(new_owner);
            Ok(OutboundMessage {
                destination: *item,
                value: fees.item_forward_value,
                body: Some(transfer.to_cell()?),
                purpose: Purpose::ItemTransfer {
                    side,
                    position,
                    new_owner,
                },
            })
        })
        .collect()
}

/// Settlement for CONFIRM_OFFER: items swap sides, fees are paid out.
pub fn settle_confirm(offer: &Offer, fees: &FeeSchedule, balance: Coins) -> Result<Settlement, OfferError> {
    let first = *offer.first_party();
    let second = *offer.second_party().ok_or(OfferError::WrongAction {
        status: offer.status(),
    })?;
    let routing = offer.routing();

    let mut out = Payouts::new(balance);
    out.extend(item_transfers(offer.first_items(), Side::First, second, fees)?)?;
    out.extend(item_transfers(offer.second_items(), Side::Second, first, fees)?)?;

    let pool = fees.fee_pool().ok_or(OfferError::Overflow)?;
    let split = fees.split(pool).ok_or(OfferError::Overflow)?;
    out.pay(routing.fee_recipient_1, split.recipient_1, Purpose::ServiceFee)?;
    out.pay(routing.fee_recipient_2, split.recipient_2, Purpose::ServiceFee)?;

    let second_payout = offer
        .first_value()
        .checked_add(unspent_tx_fee(fees, offer.second_items())?)
        .ok_or(OfferError::Overflow)?;
    out.pay(second, second_payout, Purpose::SwapProceeds)?;

    let first_payout = out.remaining();
    out.pay(first, first_payout, Purpose::SwapProceeds)?;

    Ok(out.finish(Some(split), first_payout, second_payout))
}

/// Settlement for CANCEL_OFFER: every item and deposit returns to its owner.
pub fn settle_cancel(offer: &Offer, fees: &FeeSchedule, balance: Coins) -> Result<Settlement, OfferError> {
    let first = *offer.first_party();

    let mut out = Payouts::new(balance);
    out.extend(item_transfers(offer.first_items(), Side::First, first, fees)?)?;

    let mut second_payout = Coins::ZERO;
    if let Some(second) = offer.second_party().copied() {
        out.extend(item_transfers(offer.second_items(), Side::Second, second, fees)?)?;
        let unspent = unspent_tx_fee(fees, offer.second_items())?;
        second_payout = offer
            .second_value()
            .checked_add(fees.service_fee)
            .and_then(|v| v.checked_add(unspent))
            .ok_or(OfferError::Overflow)?;
        out.pay(second, second_payout, Purpose::Refund)?;
    }

    let first_payout = out.remaining();
    out.pay(first, first_payout, Purpose::Refund)?;

    Ok(out.finish(None, first_payout, second_payout))
}

/// Part of one party's `tx_fee` not consumed forwarding its own items.
fn unspent_tx_fee(fees: &FeeSchedule, items: &ItemList) -> Result<Coins, OfferError> {
    let cost = fees.forwarding_cost(items.len()).ok_or(OfferError::Overflow)?;
    fees.tx_fee.checked_sub(cost).ok_or(OfferError::TooManyItems {
        count: items.len(),
        max: fees.max_items(),
    })
}

// ───────────────────────── Payout Accumulator ─────────────────────────

/// Outbound messages drawn against a fixed balance.
struct Payouts {
    balance: Coins,
    spent: Coins,
    messages: Vec<OutboundMessage>,
}

impl Payouts {
    fn new(balance: Coins) -> Self {
        Self {
            balance,
            spent: Coins::ZERO,
            messages: Vec::new(),
        }
    }

    fn push(&mut self, msg: OutboundMessage) -> Result<(), OfferError> {
        let spent = self.spent.checked_add(msg.value).ok_or(OfferError::Overflow)?;
        if spent > self.balance {
            return Err(OfferError::InsufficientBalance {
                required: spent,
                available: self.balance,
            });
        }
        self.spent = spent;
        self.messages.push(msg);
        Ok(())
    }

    fn extend(&mut self, msgs: Vec<OutboundMessage>) -> Result<(), OfferError> {
        msgs.into_iter().try_for_each(|m| self.push(m))
    }

    /// Plain value transfer; zero amounts are skipped.
    fn pay(&mut self, destination: Address, value: Coins, purpose: Purpose) -> Result<(), OfferError> {
        if value.is_zero() {
            return Ok(());
        }
        self.push(OutboundMessage {
            destination,
            value,
            body: None,
            purpose,
        })
    }

    fn remaining(&self) -> Coins {
        self.balance.saturating_sub(self.spent)
    }

    fn finish(self, fee_split: Option<FeeSplit>, first_payout: Coins, second_payout: Coins) -> Settlement {
        Settlement {
            messages: self.messages,
            fee_split,
            first_payout,
            second_payout,
            total_out: self.spent,
        }
    }
}
