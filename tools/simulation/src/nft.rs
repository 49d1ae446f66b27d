//! NFT items living in the sandbox
//!
//! Implements the item side of the transfer operation: only the current
//! owner may transfer, `forward_amount` goes to the new owner with an
//! ownership notification, and what is left of the attached value goes back
//! to the response destination as `excesses`. Without a response
//! destination the excess stays on the item.

use contracts::cell::{Cell, CellBuilder};
use contracts::errors::CellError;
use contracts::message::{op_body, NftTransfer};
use serde::{Deserialize, Serialize};
use types::address::Address;
use types::coins::Coins;
use types::errors::ExitCode;
use types::op;

/// Exit code of a transfer sent by someone other than the owner.
pub const ERR_NOT_OWNER: u32 = 401;
/// Exit code of a transfer whose value does not cover `forward_amount`.
pub const ERR_NOT_ENOUGH_VALUE: u32 = 402;
/// Exit code of an item receiving any other op.
pub const ERR_UNKNOWN_OP: u32 = 0xffff;

/// One non-fungible item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftItem {
    pub address: Address,
    pub owner: Address,
    /// Value kept by the item.
    pub balance: Coins,
}

/// Message produced by an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMessage {
    pub to: Address,
    pub value: Coins,
    pub body: Cell,
}

impl NftItem {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            balance: Coins::ZERO,
        }
    }

    /// Handle an inbound message, returning exit code on failure.
    pub fn receive(&mut self, sender: &Address, value: Coins, body: &Cell) -> Result<Vec<ItemMessage>, u32> {
        let transfer = NftTransfer::from_cell(body).map_err(|err| match err {
            CellError::UnexpectedOp { .. } => ERR_UNKNOWN_OP,
            _ => ExitCode::CellUnderflow.code(),
        })?;
        if *sender != self.owner {
            return Err(ERR_NOT_OWNER);
        }
        let excess = value
            .checked_sub(transfer.forward_amount)
            .ok_or(ERR_NOT_ENOUGH_VALUE)?;

        let mut out = Vec::new();
        if !transfer.forward_amount.is_zero() {
            out.push(ItemMessage {
                to: transfer.new_owner,
                value: transfer.forward_amount,
                body: ownership_assigned(transfer.query_id, sender)
                    .map_err(|_| ExitCode::CellOverflow.code())?,
            });
        }
        let mut kept = self.balance;
        match transfer.response_destination {
            Some(response) if !excess.is_zero() => out.push(ItemMessage {
                to: response,
                value: excess,
                body: op_body(op::EXCESSES, transfer.query_id)
                    .map_err(|_| ExitCode::CellOverflow.code())?,
            }),
            _ => {
                kept = kept
                    .checked_add(excess)
                    .ok_or(ExitCode::InvalidAmount.code())?;
            }
        }

        self.owner = transfer.new_owner;
        self.balance = kept;
        Ok(out)
    }
}

fn ownership_assigned(query_id: u64, prev_owner: &Address) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(op::OWNERSHIP_ASSIGNED as u128, 32)?;
    b.store_uint(query_id as u128, 64)?;
    b.store_address(prev_owner)?;
    b.store_bit(false)?;
    Ok(b.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_body(new_owner: Address, response: Option<Address>, forward: Coins) -> Cell {
        let mut t = NftTransfer::new(new_owner);
        t.response_destination = response;
        t.forward_amount = forward;
        t.to_cell().unwrap()
    }

    #[test]
    fn test_owner_transfers_with_excess() {
        let alice = Address::from_seed("alice");
        let bob = Address::from_seed("bob");
        let mut item = NftItem::new(Address::from_seed("nft"), alice);

        let out = item
            .receive(&alice, Coins::from_nano(50_000_000), &transfer_body(bob, Some(bob), Coins::ZERO))
            .unwrap();
        assert_eq!(item.owner, bob);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, bob);
        assert_eq!(out[0].value, Coins::from_nano(50_000_000));
    }

    #[test]
    fn test_forward_amount_notifies_new_owner() {
        let alice = Address::from_seed("alice");
        let bob = Address::from_seed("bob");
        let mut item = NftItem::new(Address::from_seed("nft"), alice);

        let out = item
            .receive(&alice, Coins::from_nano(10), &transfer_body(bob, Some(alice), Coins::from_nano(4)))
            .unwrap();
        assert_eq!(out[0].to, bob);
        assert_eq!(out[0].value, Coins::from_nano(4));
        assert_eq!(out[1].to, alice);
        assert_eq!(out[1].value, Coins::from_nano(6));
    }

    #[test]
    fn test_non_owner_rejected() {
        let alice = Address::from_seed("alice");
        let mallory = Address::from_seed("mallory");
        let mut item = NftItem::new(Address::from_seed("nft"), alice);
        assert_eq!(
            item.receive(&mallory, Coins::ZERO, &transfer_body(mallory, None, Coins::ZERO)),
            Err(ERR_NOT_OWNER)
        );
        assert_eq!(item.owner, alice);
    }

    #[test]
    fn test_forward_above_value_rejected() {
        let alice = Address::from_seed("alice");
        let mut item = NftItem::new(Address::from_seed("nft"), alice);
        assert_eq!(
            item.receive(&alice, Coins::from_nano(1), &transfer_body(alice, None, Coins::from_nano(2))),
            Err(ERR_NOT_ENOUGH_VALUE)
        );
    }
}
