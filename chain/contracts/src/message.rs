//! Message bodies: inbound operation decoding and outbound instructions
//!
//! # Inbound Bodies
//! ```text
//! (empty)                                  top-up, no op
//! [op: u32 = 1]                            CANCEL_OFFER
//! [op: u32 = 2][value: coins][items]       ACCEPT_OFFER
//! [op: u32 = 3]                            CONFIRM_OFFER
//! [op: u32 = 0xd53276db][query_id: u64]    excesses
//! [op: u32 = 0x05138d91][query_id: u64][prev_owner: addr?] ...
//!                                          ownership_assigned
//! ```
//!
//! # Item Transfer (TEP-62)
//! ```text
//! [op: u32 = 0x5fcc3d14][query_id: u64][new_owner: addr_std]
//! [response_destination: addr?][custom_payload: maybe ^cell = 0]
//! [forward_amount: coins][forward_payload: either cell ^cell]
//! ```

use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;
use types::offer::Side;
use types::op;

use crate::cell::{Cell, CellBuilder};
use crate::errors::CellError;
use crate::items::ItemList;

/// Decoded inbound operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Plain value transfer with an empty body.
    TopUp,
    Cancel,
    Accept { declared: Coins, items: ItemList },
    Confirm,
    /// Surplus returned by an item transfer.
    Excesses { query_id: u64 },
    /// Notification from an item that the contract now owns it.
    OwnershipAssigned {
        query_id: u64,
        prev_owner: Option<Address>,
    },
}

impl InboundMessage {
    pub fn decode(body: &Cell) -> Result<Self, OfferError> {
        if body.is_empty() {
            return Ok(InboundMessage::TopUp);
        }

        let mut s = body.parse();
        let op_code = s.load_u32()?;
        match op_code {
            op::CANCEL_OFFER => Ok(InboundMessage::Cancel),
            op::ACCEPT_OFFER => {
                let declared = s.load_coins()?;
                let items = ItemList::load(&mut s)?;
                Ok(InboundMessage::Accept { declared, items })
            }
            op::CONFIRM_OFFER => Ok(InboundMessage::Confirm),
            op::EXCESSES => Ok(InboundMessage::Excesses {
                query_id: s.load_u64()?,
            }),
            op::OWNERSHIP_ASSIGNED => Ok(InboundMessage::OwnershipAssigned {
                query_id: s.load_u64()?,
                prev_owner: s.load_maybe_address()?,
            }),
            other => Err(OfferError::UnknownOp { op: other }),
        }
    }

    pub fn op(&self) -> Option<u32> {
        match self {
            InboundMessage::TopUp => None,
            InboundMessage::Cancel => Some(op::CANCEL_OFFER),
            InboundMessage::Accept { .. } => Some(op::ACCEPT_OFFER),
            InboundMessage::Confirm => Some(op::CONFIRM_OFFER),
            InboundMessage::Excesses { .. } => Some(op::EXCESSES),
            InboundMessage::OwnershipAssigned { .. } => Some(op::OWNERSHIP_ASSIGNED),
        }
    }
}

// ───────────────────────── Client Bodies ─────────────────────────

pub fn cancel_offer_body() -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(op::CANCEL_OFFER as u128, 32)?;
    Ok(b.build())
}

pub fn accept_offer_body(declared: Coins, items: &ItemList) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(op::ACCEPT_OFFER as u128, 32)?;
    b.store_coins(declared)?;
    items.store(&mut b)?;
    Ok(b.build())
}

pub fn confirm_offer_body() -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(op::CONFIRM_OFFER as u128, 32)?;
    Ok(b.build())
}

/// Body that only carries an op code and query id.
pub fn op_body(op_code: u32, query_id: u64) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(op_code as u128, 32)?;
    b.store_uint(query_id as u128, 64)?;
    Ok(b.build())
}

// ───────────────────────── Item Transfer ─────────────────────────

/// NFT item transfer instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftTransfer {
    pub query_id: u64,
    pub new_owner: Address,
    /// Receives the value left over after the transfer.
    pub response_destination: Option<Address>,
    /// Value forwarded to `new_owner` with an ownership notification.
    pub forward_amount: Coins,
    pub forward_payload: Option<Cell>,
}

impl NftTransfer {
    pub fn new(new_owner: Address) -> Self {
        Self {
            query_id: 0,
            new_owner,
            response_destination: None,
            forward_amount: Coins::ZERO,
            forward_payload: None,
        }
    }

    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(op::NFT_TRANSFER as u128, 32)?;
        b.store_uint(self.query_id as u128, 64)?;
        b.store_address(&self.new_owner)?;
        b.store_maybe_address(self.response_destination.as_ref())?;
        b.store_bit(false)?; // no custom payload
        b.store_coins(self.forward_amount)?;
        b.store_maybe_ref(self.forward_payload.clone())?;
        Ok(b.build())
    }

    /// Decode a transfer body, op code included.
    pub fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut s = cell.parse();
        let op_code = s.load_u32()?;
        if op_code != op::NFT_TRANSFER {
            return Err(CellError::UnexpectedOp { op: op_code });
        }
        let query_id = s.load_u64()?;
        let new_owner = s.load_address()?;
        let response_destination = s.load_maybe_address()?;
        let _custom_payload = s.load_maybe_ref()?;
        let forward_amount = s.load_coins()?;
        // inline forward payloads are not interpreted
        let forward_payload = match s.remaining_bits() {
            0 => None,
            _ => s.load_maybe_ref()?.cloned(),
        };
        Ok(Self {
            query_id,
            new_owner,
            response_destination,
            forward_amount,
            forward_payload,
        })
    }
}

// ───────────────────────── Outbound ─────────────────────────

/// Why the contract is sending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Item at `position` of `side` moves to `new_owner`.
    ItemTransfer {
        side: Side,
        position: u32,
        new_owner: Address,
    },
    /// Deposit returned on cancellation.
    Refund,
    /// Counterparty's value delivered on completion.
    SwapProceeds,
    /// Share of the fee pool.
    ServiceFee,
}

/// Outbound message enqueued by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: Address,
    pub value: Coins,
    pub body: Option<Cell>,
    pub purpose: Purpose,
}

impl OutboundMessage {
    pub fn is_item_transfer(&self) -> bool {
        matches!(self.purpose, Purpose::ItemTransfer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::store_entries;

    #[test]
    fn test_empty_body_is_top_up() {
        assert_eq!(InboundMessage::decode(&Cell::empty()).unwrap(), InboundMessage::TopUp);
    }

    #[test]
    fn test_decode_cancel_and_confirm() {
        assert_eq!(
            InboundMessage::decode(&cancel_offer_body().unwrap()).unwrap(),
            InboundMessage::Cancel
        );
        assert_eq!(
            InboundMessage::decode(&confirm_offer_body().unwrap()).unwrap(),
            InboundMessage::Confirm
        );
    }

    #[test]
    fn test_decode_accept() {
        let items: ItemList = (1..=2)
            .map(|i| Address::from_seed(&format!("nft-{}", i)))
            .collect();
        let body = accept_offer_body(Coins::from_units(1), &items).unwrap();
        match InboundMessage::decode(&body).unwrap() {
            InboundMessage::Accept { declared, items: decoded } => {
                assert_eq!(declared, Coins::from_units(1));
                assert_eq!(decoded, items);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_accept_with_gap() {
        let mut b = CellBuilder::new();
        b.store_uint(op::ACCEPT_OFFER as u128, 32).unwrap();
        b.store_coins(Coins::ZERO).unwrap();
        store_entries(&mut b, &[(2, Address::from_seed("nft"))]).unwrap();
        assert_eq!(
            InboundMessage::decode(&b.build()),
            Err(OfferError::DictValueNotFound { position: 1 })
        );
    }

    #[test]
    fn test_decode_unknown_op() {
        let body = op_body(0x1234, 0).unwrap();
        assert_eq!(
            InboundMessage::decode(&body),
            Err(OfferError::UnknownOp { op: 0x1234 })
        );
    }

    #[test]
    fn test_decode_truncated_op() {
        let mut b = CellBuilder::new();
        b.store_uint(1, 8).unwrap();
        let err = InboundMessage::decode(&b.build()).unwrap_err();
        assert!(matches!(err, OfferError::Malformed { .. }));
    }

    #[test]
    fn test_decode_truncated_accept() {
        let mut b = CellBuilder::new();
        b.store_uint(op::ACCEPT_OFFER as u128, 32).unwrap();
        let err = InboundMessage::decode(&b.build()).unwrap_err();
        assert!(matches!(err, OfferError::Malformed { .. }));
    }

    #[test]
    fn test_decode_notifications() {
        let body = op_body(op::EXCESSES, 7).unwrap();
        assert_eq!(
            InboundMessage::decode(&body).unwrap(),
            InboundMessage::Excesses { query_id: 7 }
        );
    }

    #[test]
    fn test_nft_transfer_layout() {
        let owner = Address::from_seed("second user");
        let mut transfer = NftTransfer::new(owner);
        transfer.response_destination = Some(owner);
        let cell = transfer.to_cell().unwrap();
        // op + query + addr + addr + custom bit + coins(0) + payload bit
        assert_eq!(cell.bit_len(), 32 + 64 + 267 + 267 + 1 + 4 + 1);

        let decoded = NftTransfer::from_cell(&cell).unwrap();
        assert_eq!(decoded, transfer);
    }

    #[test]
    fn test_nft_transfer_with_forward_payload() {
        let mut payload = CellBuilder::new();
        payload.store_uint(0xfeed, 16).unwrap();
        let mut transfer = NftTransfer::new(Address::from_seed("x"));
        transfer.forward_amount = Coins::from_nano(1);
        transfer.forward_payload = Some(payload.build());

        let decoded = NftTransfer::from_cell(&transfer.to_cell().unwrap()).unwrap();
        assert_eq!(decoded, transfer);
    }

    #[test]
    fn test_nft_transfer_rejects_other_op() {
        assert!(NftTransfer::from_cell(&cancel_offer_body().unwrap()).is_err());
    }
}
