//! Escrow Ledger: the persistent state of one offer
//!
//! Pure data holder. Authorization and value accounting live in the
//! dispatcher and engine; the ledger only enforces its own shape:
//! a non-empty first-side collection at creation, a second party that is
//! set once, and no mutation after a terminal status.
//!
//! # Persisted Layout
//! ```text
//! [status: u16]
//! [first_party: addr_std]   [first_value: coins]   [first_items: collection]
//! [second_party: addr?]     [second_value: coins]  [second_items: collection]
//! [accepted: 1][accepted_at: u64]   (time present only once accepted)
//! ^[admin: addr_std][fee_recipient_1: addr_std][fee_recipient_2: addr_std]
//! ```

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;
use types::fee::FeeSchedule;
use types::offer::{OfferStatus, Side};

use crate::cell::{Cell, CellBuilder};
use crate::errors::CellError;
use crate::items::ItemList;

/// Immutable service routing addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRouting {
    /// May cancel once the post-acceptance deadline has passed.
    pub admin: Address,
    pub fee_recipient_1: Address,
    pub fee_recipient_2: Address,
}

impl ServiceRouting {
    fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_address(&self.admin)?;
        b.store_address(&self.fee_recipient_1)?;
        b.store_address(&self.fee_recipient_2)?;
        Ok(b.build())
    }

    fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut s = cell.parse();
        let routing = Self {
            admin: s.load_address()?,
            fee_recipient_1: s.load_address()?,
            fee_recipient_2: s.load_address()?,
        };
        s.end_parse()?;
        Ok(routing)
    }
}

/// Terms recorded when the second party accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceptance {
    pub party: Address,
    pub value: Coins,
    pub items: ItemList,
    pub accepted_at: u64,
}

/// One offer's escrow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    status: OfferStatus,
    first_party: Address,
    first_value: Coins,
    first_items: ItemList,
    second_party: Option<Address>,
    second_value: Coins,
    second_items: ItemList,
    accepted_at: Option<u64>,
    routing: ServiceRouting,
}

impl Offer {
    /// Create an offer in `WAIT_SECOND`.
    ///
    /// The first-side collection must be non-empty and forwardable within one
    /// party's `tx_fee`.
    pub fn create(
        first_party: Address,
        first_value: Coins,
        first_items: ItemList,
        routing: ServiceRouting,
        fees: &FeeSchedule,
    ) -> Result<Self, OfferError> {
        if first_items.is_empty() {
            return Err(OfferError::DictEmpty);
        }
        if first_items.len() > fees.max_items() {
            return Err(OfferError::TooManyItems {
                count: first_items.len(),
                max: fees.max_items(),
            });
        }
        Ok(Self {
            status: OfferStatus::WaitSecond,
            first_party,
            first_value,
            first_items,
            second_party: None,
            second_value: Coins::ZERO,
            second_items: ItemList::empty(),
            accepted_at: None,
            routing,
        })
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn status(&self) -> OfferStatus {
        self.status
    }

    pub fn first_party(&self) -> &Address {
        &self.first_party
    }

    pub fn first_value(&self) -> Coins {
        self.first_value
    }

    pub fn first_items(&self) -> &ItemList {
        &self.first_items
    }

    pub fn second_party(&self) -> Option<&Address> {
        self.second_party.as_ref()
    }

    pub fn second_value(&self) -> Coins {
        self.second_value
    }

    pub fn second_items(&self) -> &ItemList {
        &self.second_items
    }

    pub fn accepted_at(&self) -> Option<u64> {
        self.accepted_at
    }

    pub fn routing(&self) -> &ServiceRouting {
        &self.routing
    }

    pub fn items(&self, side: Side) -> &ItemList {
        match side {
            Side::First => &self.first_items,
            Side::Second => &self.second_items,
        }
    }

    /// Item at a 1-based position in one side's collection.
    pub fn get_item_at(&self, side: Side, position: u32) -> Result<Address, OfferError> {
        self.items(side).get(position)
    }

    // ───────────────────────── Transitions ─────────────────────────

    /// Record the second party. Only valid in `WAIT_SECOND`.
    pub(crate) fn record_acceptance(&mut self, acceptance: Acceptance) -> Result<(), OfferError> {
        if self.status != OfferStatus::WaitSecond {
            return Err(OfferError::WrongAction {
                status: self.status,
            });
        }
        self.second_party = Some(acceptance.party);
        self.second_value = acceptance.value;
        self.second_items = acceptance.items;
        self.accepted_at = Some(acceptance.accepted_at);
        self.status = OfferStatus::WaitConfirm;
        Ok(())
    }

    /// Move to a terminal status.
    pub(crate) fn finish(&mut self, status: OfferStatus) -> Result<(), OfferError> {
        if self.status.is_terminal() || !status.is_terminal() {
            return Err(OfferError::WrongAction {
                status: self.status,
            });
        }
        self.status = status;
        Ok(())
    }

    // ───────────────────────── Persistence ─────────────────────────

    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(self.status.code() as u128, 16)?;
        b.store_address(&self.first_party)?;
        b.store_coins(self.first_value)?;
        self.first_items.store(&mut b)?;
        b.store_maybe_address(self.second_party.as_ref())?;
        b.store_coins(self.second_value)?;
        self.second_items.store(&mut b)?;
        b.store_bit(self.accepted_at.is_some())?;
        if let Some(t) = self.accepted_at {
            b.store_uint(t as u128, 64)?;
        }
        b.store_ref(self.routing.to_cell()?)?;
        Ok(b.build())
    }

    pub fn from_cell(cell: &Cell) -> Result<Self, OfferError> {
        let mut s = cell.parse();

        let code = s.load_u16()?;
        let status = OfferStatus::from_code(code).ok_or(CellError::InvalidStatus { code })?;
        let first_party = s.load_address()?;
        let first_value = s.load_coins()?;
        let first_items = ItemList::load(&mut s)?;
        let second_party = s.load_maybe_address()?;
        let second_value = s.load_coins()?;
        let second_items = ItemList::load(&mut s)?;
        let accepted_at = if s.load_bit()? {
            Some(s.load_u64()?)
        } else {
            None
        };
        let routing = ServiceRouting::from_cell(s.load_ref()?)?;
        s.end_parse()?;

        let offer = Self {
            status,
            first_party,
            first_value,
            first_items,
            second_party,
            second_value,
            second_items,
            accepted_at,
            routing,
        };
        offer.check_shape()?;
        Ok(offer)
    }

    /// Field combinations the transitions can produce for `status`.
    fn check_shape(&self) -> Result<(), CellError> {
        let code = self.status.code();
        let reject = |reason| Err(CellError::InconsistentState { code, reason });
        if self.first_items.is_empty() {
            return reject("first items empty");
        }
        if self.second_party.is_some() != self.accepted_at.is_some() {
            return reject("second party and acceptance time disagree");
        }
        if self.second_party.is_none()
            && (!self.second_items.is_empty() || !self.second_value.is_zero())
        {
            return reject("second side holds assets without a second party");
        }
        match self.status {
            OfferStatus::WaitSecond if self.second_party.is_some() => reject("already accepted"),
            OfferStatus::WaitConfirm | OfferStatus::OfferCompleted
                if self.second_party.is_none() =>
            {
                reject("not accepted")
            }
            _ => Ok(()),
        }
    }

    /// Address of a contract deployed with this state as its initial data.
    pub fn contract_address(&self, workchain: i8) -> Result<Address, CellError> {
        Ok(Address::new(workchain, self.to_cell()?.hash()))
    }
}
