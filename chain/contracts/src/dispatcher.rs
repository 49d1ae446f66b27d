//! Command Dispatcher: the offer contract's message entry point
//!
//! Decodes each inbound body, checks status then sender then value, and
//! commits the new state only after every outbound message has been
//! computed. A rejected message leaves state and balance untouched; the
//! runtime bounces its value back to the sender.
//!
//! # Handlers
//! - empty body: top-up while non-terminal
//! - CANCEL_OFFER: settle back to the owners, status `OFFER_CANCELED`
//! - ACCEPT_OFFER: record the second party, status `WAIT_CONFIRM`
//! - CONFIRM_OFFER: swap and pay fees, status `OFFER_COMPLETED`
//! - `excesses` / `ownership_assigned`: credit value, no state change

use tracing::{debug, info, warn};
use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;
use types::offer::OfferStatus;

use crate::cell::Cell;
use crate::config::ContractConfig;
use crate::engine::{self, Settlement};
use crate::errors::CellError;
use crate::events::{
    ContractEvent, OfferAccepted, OfferCanceled, OfferConfirmed, OfferDeployed, ToppedUp,
};
use crate::items::ItemList;
use crate::message::{InboundMessage, OutboundMessage};
use crate::security::{AccessControl, Role};
use crate::storage::{Acceptance, Offer};

/// Workchain new offers are deployed to.
pub const BASECHAIN: i8 = 0;

/// Runtime facts about the inbound message being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageContext {
    pub sender: Address,
    /// Value attached to the message.
    pub value: Coins,
    /// Unix time of the current block.
    pub now: u64,
}

impl MessageContext {
    pub fn new(sender: Address, value: Coins, now: u64) -> Self {
        Self { sender, value, now }
    }
}

/// One deployed offer contract: ledger, configuration and balance.
#[derive(Debug, Clone)]
pub struct OfferContract {
    address: Address,
    offer: Offer,
    config: ContractConfig,
    balance: Coins,
    events: Vec<ContractEvent>,
}

impl OfferContract {
    /// Deploy `offer`. The deploying message must come from the first party
    /// and carry `first_value + total_fee`.
    pub fn deploy(
        offer: Offer,
        config: ContractConfig,
        ctx: &MessageContext,
    ) -> Result<Self, OfferError> {
        config.validate()?;
        if ctx.sender != *offer.first_party() {
            return Err(OfferError::InvalidAddress { sender: ctx.sender });
        }
        engine::check_item_budget(&config.fees, offer.first_items())?;
        engine::check_deposit(&config.fees, offer.first_value(), ctx.value)?;

        let address = offer.contract_address(BASECHAIN)?;
        info!(
            contract = %address,
            first_party = %ctx.sender,
            first_value = %offer.first_value(),
            items = offer.first_items().len(),
            deposit = %ctx.value,
            "Offer deployed"
        );

        let event = ContractEvent::OfferDeployed(OfferDeployed {
            contract: address,
            first_party: ctx.sender,
            first_value: offer.first_value(),
            item_count: offer.first_items().len(),
            deposit: ctx.value,
            deployed_at: ctx.now,
        });

        Ok(Self {
            address,
            offer,
            config,
            balance: ctx.value,
            events: vec![event],
        })
    }

    /// Restore a contract from its persisted state cell.
    pub fn restore(
        address: Address,
        state: &Cell,
        config: ContractConfig,
        balance: Coins,
    ) -> Result<Self, OfferError> {
        config.validate()?;
        let offer = Offer::from_cell(state)?;
        engine::check_item_budget(&config.fees, offer.first_items())?;
        engine::check_item_budget(&config.fees, offer.second_items())?;
        Ok(Self {
            address,
            offer,
            config,
            balance,
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn balance(&self) -> Coins {
        self.balance
    }

    /// Persisted state cell.
    pub fn state_cell(&self) -> Result<Cell, CellError> {
        self.offer.to_cell()
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Entry Point ─────────────────────────

    /// Process one inbound message. On success returns the outbound messages
    /// to enqueue; on failure nothing has changed.
    pub fn receive(
        &mut self,
        ctx: &MessageContext,
        body: &Cell,
    ) -> Result<Vec<OutboundMessage>, OfferError> {
        match self.dispatch(ctx, body) {
            Ok(outbound) => {
                debug!(
                    contract = %self.address,
                    outbound = outbound.len(),
                    balance = %self.balance,
                    "Message processed"
                );
                Ok(outbound)
            }
            Err(err) => {
                warn!(
                    contract = %self.address,
                    sender = %ctx.sender,
                    status = %self.offer.status(),
                    exit_code = err.exit_code().code(),
                    error = %err,
                    "Message rejected"
                );
                Err(err)
            }
        }
    }

    fn dispatch(
        &mut self,
        ctx: &MessageContext,
        body: &Cell,
    ) -> Result<Vec<OutboundMessage>, OfferError> {
        match InboundMessage::decode(body)? {
            InboundMessage::TopUp => self.on_top_up(ctx),
            InboundMessage::Cancel => self.on_cancel(ctx),
            InboundMessage::Accept { declared, items } => self.on_accept(ctx, declared, items),
            InboundMessage::Confirm => self.on_confirm(ctx),
            InboundMessage::Excesses { .. } | InboundMessage::OwnershipAssigned { .. } => {
                self.on_notification(ctx)
            }
        }
    }

    // ───────────────────────── Handlers ─────────────────────────

    fn on_top_up(&mut self, ctx: &MessageContext) -> Result<Vec<OutboundMessage>, OfferError> {
        self.require_open()?;
        let balance = self.credited(ctx)?;

        self.balance = balance;
        self.events.push(ContractEvent::ToppedUp(ToppedUp {
            sender: ctx.sender,
            amount: ctx.value,
            balance,
        }));
        Ok(Vec::new())
    }

    fn on_notification(&mut self, ctx: &MessageContext) -> Result<Vec<OutboundMessage>, OfferError> {
        self.require_open()?;
        self.balance = self.credited(ctx)?;
        Ok(Vec::new())
    }

    fn on_accept(
        &mut self,
        ctx: &MessageContext,
        declared: Coins,
        items: ItemList,
    ) -> Result<Vec<OutboundMessage>, OfferError> {
        if self.offer.status() != OfferStatus::WaitSecond {
            return Err(OfferError::WrongAction {
                status: self.offer.status(),
            });
        }
        self.access().authorize_accept(&ctx.sender)?;
        engine::check_deposit(&self.config.fees, declared, ctx.value)?;
        engine::check_item_budget(&self.config.fees, &items)?;
        let balance = self.credited(ctx)?;

        let item_count = items.len();
        let mut offer = self.offer.clone();
        offer.record_acceptance(Acceptance {
            party: ctx.sender,
            value: declared,
            items,
            accepted_at: ctx.now,
        })?;

        self.offer = offer;
        self.balance = balance;
        info!(
            contract = %self.address,
            second_party = %ctx.sender,
            second_value = %declared,
            items = item_count,
            "Offer accepted"
        );
        self.events.push(ContractEvent::OfferAccepted(OfferAccepted {
            second_party: ctx.sender,
            second_value: declared,
            item_count,
            deposit: ctx.value,
            accepted_at: ctx.now,
        }));
        Ok(Vec::new())
    }

    fn on_confirm(&mut self, ctx: &MessageContext) -> Result<Vec<OutboundMessage>, OfferError> {
        if self.offer.status() != OfferStatus::WaitConfirm {
            return Err(OfferError::WrongAction {
                status: self.offer.status(),
            });
        }
        self.access().authorize_confirm(&ctx.sender)?;
        let balance = self.credited(ctx)?;
        let settlement = engine::settle_confirm(&self.offer, &self.config.fees, balance)?;
        let fee_split = settlement.fee_split.ok_or(OfferError::Overflow)?;

        let mut offer = self.offer.clone();
        offer.finish(OfferStatus::OfferCompleted)?;
        self.commit(offer, balance, &settlement)?;

        info!(
            contract = %self.address,
            fee_recipient_1 = %fee_split.recipient_1,
            fee_recipient_2 = %fee_split.recipient_2,
            first_payout = %settlement.first_payout,
            second_payout = %settlement.second_payout,
            "Offer completed"
        );
        self.events.push(ContractEvent::OfferConfirmed(OfferConfirmed {
            fee_split,
            first_payout: settlement.first_payout,
            second_payout: settlement.second_payout,
            items_transferred: settlement.item_transfer_count() as u32,
            confirmed_at: ctx.now,
        }));
        Ok(settlement.messages)
    }

    fn on_cancel(&mut self, ctx: &MessageContext) -> Result<Vec<OutboundMessage>, OfferError> {
        self.require_open()?;
        let role: Role = self.access().authorize_cancel(&ctx.sender, ctx.now)?;
        let balance = self.credited(ctx)?;
        let settlement = engine::settle_cancel(&self.offer, &self.config.fees, balance)?;

        let mut offer = self.offer.clone();
        offer.finish(OfferStatus::OfferCanceled)?;
        self.commit(offer, balance, &settlement)?;

        info!(
            contract = %self.address,
            canceled_by = %ctx.sender,
            role = ?role,
            first_refund = %settlement.first_payout,
            second_refund = %settlement.second_payout,
            "Offer canceled"
        );
        self.events.push(ContractEvent::OfferCanceled(OfferCanceled {
            canceled_by: ctx.sender,
            role,
            first_refund: settlement.first_payout,
            second_refund: settlement.second_payout,
            items_returned: settlement.item_transfer_count() as u32,
            canceled_at: ctx.now,
        }));
        Ok(settlement.messages)
    }

    // ───────────────────────── Helpers ─────────────────────────

    fn access(&self) -> AccessControl<'_> {
        AccessControl::new(&self.offer, self.config.admin_cancel_delay_secs)
    }

    fn require_open(&self) -> Result<(), OfferError> {
        if self.offer.status().is_terminal() {
            return Err(OfferError::WrongAction {
                status: self.offer.status(),
            });
        }
        Ok(())
    }

    /// Balance once the inbound value is credited.
    fn credited(&self, ctx: &MessageContext) -> Result<Coins, OfferError> {
        self.balance
            .checked_add(ctx.value)
            .ok_or(OfferError::Overflow)
    }

    fn commit(
        &mut self,
        offer: Offer,
        balance: Coins,
        settlement: &Settlement,
    ) -> Result<(), OfferError> {
        let remaining = balance
            .checked_sub(settlement.total_out)
            .ok_or(OfferError::InsufficientBalance {
                required: settlement.total_out,
                available: balance,
            })?;
        debug!(
            contract = %self.address,
            item_transfers = settlement.item_transfer_count(),
            messages = settlement.messages.len(),
            total_out = %settlement.total_out,
            "Settlement fan-out"
        );
        self.offer = offer;
        self.balance = remaining;
        Ok(())
    }
}
