//! Deterministic in-memory chain
//!
//! Holds wallets, NFT items and offer contracts, and delivers messages one
//! at a time in FIFO order until the queue drains. Value is conserved:
//! every nano-unit lives in a wallet, an item, an offer balance, or the
//! unclaimed pool of a failed non-bounceable message.
//!
//! # Delivery
//! - wallet: value credited, always succeeds
//! - item: TEP-62 transfer semantics (see `nft`)
//! - offer: `OfferContract::receive` with the current clock
//!
//! A failed bounceable message is returned to its sender with an empty body.
//! Contract and item outbound messages are not bounceable.

use std::collections::{BTreeMap, VecDeque};

use contracts::cell::Cell;
use contracts::config::ContractConfig;
use contracts::errors::CellError;
use contracts::getters::{GetMethodError, StackValue};
use contracts::items::ItemList;
use contracts::storage::{Offer, ServiceRouting};
use contracts::{MessageContext, OfferContract};
use thiserror::Error;
use tracing::{debug, info, warn};
use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;

use crate::nft::NftItem;
use crate::transaction::{SendResult, Transaction};

/// Clock value of a fresh chain.
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Starting balance of a treasury wallet.
pub const TREASURY_BALANCE: Coins = Coins::from_units(1_000_000);

/// Upper bound on deliveries caused by one external message.
const MAX_DELIVERIES: usize = 10_000;

/// Sandbox errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Unknown wallet: {0}")]
    UnknownWallet(Address),

    #[error("Insufficient funds in {wallet}: balance {balance}, required {required}")]
    InsufficientFunds {
        wallet: Address,
        balance: Coins,
        required: Coins,
    },

    #[error("Address already in use: {0}")]
    AddressInUse(Address),

    #[error("Unknown offer: {0}")]
    UnknownOffer(Address),

    #[error("Offer rejected: {0}")]
    Offer(#[from] OfferError),

    #[error("Get method failed: {0}")]
    GetMethod(#[from] GetMethodError),

    #[error("Encoding failed: {0}")]
    Cell(#[from] CellError),
}

#[derive(Debug, Clone)]
struct Envelope {
    from: Address,
    to: Address,
    value: Coins,
    body: Cell,
    bounce: bool,
    bounced: bool,
}

enum Delivery {
    Delivered(Vec<Envelope>),
    Failed(u32),
}

/// In-memory chain sandbox.
#[derive(Debug, Clone)]
pub struct Blockchain {
    now: u64,
    config: ContractConfig,
    wallets: BTreeMap<Address, Coins>,
    items: BTreeMap<Address, NftItem>,
    offers: BTreeMap<Address, OfferContract>,
    unclaimed: BTreeMap<Address, Coins>,
    log: Vec<Transaction>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self::empty(ContractConfig::default())
    }

    /// Chain whose offers are deployed with `config`.
    pub fn with_config(config: ContractConfig) -> Result<Self, SimError> {
        config.validate().map_err(OfferError::from)?;
        Ok(Self::empty(config))
    }

    fn empty(config: ContractConfig) -> Self {
        Self {
            now: GENESIS_TIME,
            config,
            wallets: BTreeMap::new(),
            items: BTreeMap::new(),
            offers: BTreeMap::new(),
            unclaimed: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    // ───────────────────────── Clock ─────────────────────────

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    // ───────────────────────── Accounts ─────────────────────────

    /// Wallet derived from `seed`, funded on first use.
    pub fn treasury(&mut self, seed: &str) -> Address {
        let address = Address::from_seed(seed);
        self.wallets.entry(address).or_insert(TREASURY_BALANCE);
        address
    }

    pub fn wallet_balance(&self, address: &Address) -> Coins {
        self.wallets.get(address).copied().unwrap_or_default()
    }

    /// Mint an item owned by `owner`.
    pub fn mint_item(&mut self, seed: &str, owner: Address) -> Result<Address, SimError> {
        let address = Address::from_seed(seed);
        if self.items.contains_key(&address) || self.wallets.contains_key(&address) {
            return Err(SimError::AddressInUse(address));
        }
        self.items.insert(address, NftItem::new(address, owner));
        Ok(address)
    }

    pub fn item(&self, address: &Address) -> Option<&NftItem> {
        self.items.get(address)
    }

    pub fn item_owner(&self, address: &Address) -> Option<Address> {
        self.items.get(address).map(|item| item.owner)
    }

    pub fn offer(&self, address: &Address) -> Option<&OfferContract> {
        self.offers.get(address)
    }

    /// Items currently owned by `owner`.
    pub fn items_owned_by(&self, owner: &Address) -> usize {
        self.items.values().filter(|item| item.owner == *owner).count()
    }

    /// All value on the chain, `None` if the total overflows.
    pub fn total_value(&self) -> Option<Coins> {
        let wallets = self.wallets.values().copied();
        let items = self.items.values().map(|i| i.balance);
        let offers = self.offers.values().map(|o| o.balance());
        let unclaimed = self.unclaimed.values().copied();
        Coins::checked_sum(wallets.chain(items).chain(offers).chain(unclaimed))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    // ───────────────────────── Offers ─────────────────────────

    /// Deploy an offer from `first_party`'s wallet with `value` attached.
    pub fn deploy_offer(
        &mut self,
        first_party: Address,
        first_value: Coins,
        first_items: ItemList,
        routing: ServiceRouting,
        value: Coins,
    ) -> Result<(Address, SendResult), SimError> {
        self.ensure_funds(&first_party, value)?;
        let offer = Offer::create(first_party, first_value, first_items, routing, &self.config.fees)?;
        let ctx = MessageContext::new(first_party, value, self.now);
        let contract = OfferContract::deploy(offer, self.config.clone(), &ctx)?;
        let address = *contract.address();
        if self.offers.contains_key(&address) {
            return Err(SimError::AddressInUse(address));
        }

        self.debit(&first_party, value)?;
        self.offers.insert(address, contract);
        info!(offer = %address, first_party = %first_party, value = %value, "Offer deployed");

        let tx = Transaction {
            from: first_party,
            to: address,
            value,
            op: None,
            success: true,
            exit_code: None,
            outbound: 0,
            bounced: false,
            now: self.now,
        };
        self.log.push(tx.clone());
        Ok((
            address,
            SendResult {
                transactions: vec![tx],
            },
        ))
    }

    /// Call a named get method on an offer.
    pub fn run_get_method(
        &self,
        offer: &Address,
        name: &str,
        args: &[u64],
    ) -> Result<StackValue, SimError> {
        let contract = self
            .offers
            .get(offer)
            .ok_or(SimError::UnknownOffer(*offer))?;
        Ok(contract.run_get_method(name, args)?)
    }

    // ───────────────────────── Messaging ─────────────────────────

    /// Send one bounceable message from a wallet and run it to completion.
    pub fn send(
        &mut self,
        from: Address,
        to: Address,
        value: Coins,
        body: Cell,
    ) -> Result<SendResult, SimError> {
        self.send_batch(from, vec![(to, value, body)])
    }

    /// Send several messages from one wallet in a single batch; they are
    /// delivered in order.
    pub fn send_batch(
        &mut self,
        from: Address,
        messages: Vec<(Address, Coins, Cell)>,
    ) -> Result<SendResult, SimError> {
        let total = Coins::checked_sum(messages.iter().map(|(_, value, _)| *value))
            .ok_or(SimError::Offer(OfferError::Overflow))?;
        self.debit(&from, total)?;

        let queue = messages
            .into_iter()
            .map(|(to, value, body)| Envelope {
                from,
                to,
                value,
                body,
                bounce: true,
                bounced: false,
            })
            .collect();
        Ok(self.process(queue))
    }

    fn process(&mut self, mut queue: VecDeque<Envelope>) -> SendResult {
        let mut result = SendResult::default();
        let mut deliveries = 0usize;

        while let Some(env) = queue.pop_front() {
            deliveries += 1;
            if deliveries > MAX_DELIVERIES {
                warn!(pending = queue.len() + 1, "Delivery limit reached, dropping queue");
                break;
            }

            let (success, exit_code, outbound) = match self.deliver(&env) {
                Delivery::Delivered(out) => (true, None, out),
                Delivery::Failed(code) => (false, Some(code), Vec::new()),
            };
            debug!(
                from = %env.from,
                to = %env.to,
                value = %env.value,
                success,
                exit_code = exit_code.unwrap_or(0),
                outbound = outbound.len(),
                "Message delivered"
            );

            let tx = Transaction {
                from: env.from,
                to: env.to,
                value: env.value,
                op: body_op(&env.body),
                success,
                exit_code,
                outbound: outbound.len(),
                bounced: env.bounced,
                now: self.now,
            };
            self.log.push(tx.clone());
            result.extend(SendResult {
                transactions: vec![tx],
            });

            if !success {
                if env.bounce && !env.bounced {
                    info!(from = %env.to, to = %env.from, value = %env.value, "Bouncing message");
                    queue.push_back(Envelope {
                        from: env.to,
                        to: env.from,
                        value: env.value,
                        body: Cell::empty(),
                        bounce: false,
                        bounced: true,
                    });
                } else {
                    let kept = self.unclaimed.entry(env.to).or_default();
                    *kept = kept.checked_add(env.value).unwrap_or(*kept);
                }
            }
            queue.extend(outbound);
        }
        result
    }

    fn deliver(&mut self, env: &Envelope) -> Delivery {
        if let Some(contract) = self.offers.get_mut(&env.to) {
            let ctx = MessageContext::new(env.from, env.value, self.now);
            return match contract.receive(&ctx, &env.body) {
                Ok(out) => Delivery::Delivered(
                    out.into_iter()
                        .map(|m| Envelope {
                            from: env.to,
                            to: m.destination,
                            value: m.value,
                            body: m.body.unwrap_or_default(),
                            bounce: false,
                            bounced: false,
                        })
                        .collect(),
                ),
                Err(err) => Delivery::Failed(err.exit_code().code()),
            };
        }

        if let Some(item) = self.items.get_mut(&env.to) {
            if env.bounced {
                item.balance = item.balance.checked_add(env.value).unwrap_or(item.balance);
                return Delivery::Delivered(Vec::new());
            }
            return match item.receive(&env.from, env.value, &env.body) {
                Ok(out) => Delivery::Delivered(
                    out.into_iter()
                        .map(|m| Envelope {
                            from: env.to,
                            to: m.to,
                            value: m.value,
                            body: m.body,
                            bounce: false,
                            bounced: false,
                        })
                        .collect(),
                ),
                Err(code) => Delivery::Failed(code),
            };
        }

        let balance = self.wallets.entry(env.to).or_default();
        match balance.checked_add(env.value) {
            Some(updated) => {
                *balance = updated;
                Delivery::Delivered(Vec::new())
            }
            None => Delivery::Failed(types::errors::ExitCode::InvalidAmount.code()),
        }
    }

    fn ensure_funds(&self, wallet: &Address, required: Coins) -> Result<(), SimError> {
        let balance = *self
            .wallets
            .get(wallet)
            .ok_or(SimError::UnknownWallet(*wallet))?;
        if balance < required {
            return Err(SimError::InsufficientFunds {
                wallet: *wallet,
                balance,
                required,
            });
        }
        Ok(())
    }

    fn debit(&mut self, wallet: &Address, amount: Coins) -> Result<(), SimError> {
        self.ensure_funds(wallet, amount)?;
        if let Some(balance) = self.wallets.get_mut(wallet) {
            *balance = balance.saturating_sub(amount);
        }
        Ok(())
    }
}

/// Leading op code of a body, if any.
fn body_op(body: &Cell) -> Option<u32> {
    if body.is_empty() {
        return None;
    }
    body.parse().load_u32().ok()
}
