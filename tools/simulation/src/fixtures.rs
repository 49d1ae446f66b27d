//! Reusable setup for offer scenarios
//!
//! Mirrors how a wallet client drives an offer: mint items, deploy the
//! offer, move the first party's items into custody, then accept with the
//! second party's items and value in one wallet batch.

use contracts::cell::Cell;
use contracts::items::ItemList;
use contracts::message::{accept_offer_body, NftTransfer};
use contracts::storage::ServiceRouting;
use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;

use crate::chain::{Blockchain, SimError};
use crate::transaction::SendResult;

/// Everyone taking part in one offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parties {
    pub first: Address,
    pub second: Address,
    pub admin: Address,
    pub fee_recipient_1: Address,
    pub fee_recipient_2: Address,
}

impl Parties {
    /// Fund the standard wallets.
    pub fn setup(chain: &mut Blockchain) -> Self {
        Self {
            first: chain.treasury("first user"),
            second: chain.treasury("second user"),
            admin: chain.treasury("admin"),
            fee_recipient_1: chain.treasury("serviceWallet1"),
            fee_recipient_2: chain.treasury("serviceWallet2"),
        }
    }

    pub fn routing(&self) -> ServiceRouting {
        ServiceRouting {
            admin: self.admin,
            fee_recipient_1: self.fee_recipient_1,
            fee_recipient_2: self.fee_recipient_2,
        }
    }
}

/// Mint `count` items owned by `owner`, seeded `"{prefix}-{i}"`.
pub fn init_items(
    chain: &mut Blockchain,
    owner: Address,
    prefix: &str,
    count: usize,
) -> Result<ItemList, SimError> {
    (1..=count)
        .map(|i| chain.mint_item(&format!("{}-{}", prefix, i), owner))
        .collect()
}

/// Transfer instruction moving an item from its owner's wallet to `to`,
/// with the attached value returned to the owner.
pub fn transfer_item_message(
    chain: &Blockchain,
    owner: Address,
    item: Address,
    to: Address,
) -> Result<(Address, Coins, Cell), SimError> {
    let mut transfer = NftTransfer::new(to);
    transfer.response_destination = Some(owner);
    Ok((item, chain.config().fees.item_forward_value, transfer.to_cell()?))
}

/// Deploy an offer and move the first party's items into its custody.
pub fn deploy_offer(
    chain: &mut Blockchain,
    parties: &Parties,
    first_value: Coins,
    items: &ItemList,
) -> Result<Address, SimError> {
    let deposit = chain
        .config()
        .fees
        .required_deposit(first_value)
        .ok_or(SimError::Offer(OfferError::Overflow))?;
    let (offer, _) = chain.deploy_offer(
        parties.first,
        first_value,
        items.clone(),
        parties.routing(),
        deposit,
    )?;

    let transfers = items
        .addresses()
        .iter()
        .map(|item| transfer_item_message(chain, parties.first, *item, offer))
        .collect::<Result<Vec<_>, _>>()?;
    chain.send_batch(parties.first, transfers)?;
    Ok(offer)
}

/// The second party's wallet batch: every item transfer, then the accept
/// message carrying `value + total_fee`.
pub fn accept_stage(
    chain: &mut Blockchain,
    offer: Address,
    second: Address,
    value: Coins,
    items: &ItemList,
) -> Result<SendResult, SimError> {
    let deposit = chain
        .config()
        .fees
        .required_deposit(value)
        .ok_or(SimError::Offer(OfferError::Overflow))?;

    let mut batch = items
        .addresses()
        .iter()
        .map(|item| transfer_item_message(chain, second, *item, offer))
        .collect::<Result<Vec<_>, _>>()?;
    batch.push((offer, deposit, accept_offer_body(value, items)?));
    chain.send_batch(second, batch)
}
