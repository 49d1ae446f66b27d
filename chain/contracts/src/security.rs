//! Per-state access control for offer operations
//!
//! Resolves the sender of an inbound operation to the role it acts under.
//! Status checks (`WRONG_ACTION`) happen in the dispatcher before these
//! guards run; every guard here fails with `INVALID_ADDRESS`.

use serde::{Deserialize, Serialize};
use types::address::Address;
use types::errors::OfferError;
use types::offer::OfferStatus;

use crate::storage::Offer;

/// Role a sender acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Created the offer; may cancel while non-terminal and confirm.
    FirstParty,
    /// Accepted the offer; may cancel after acceptance.
    SecondParty,
    /// Service admin; may cancel once the post-acceptance deadline passed.
    Admin,
}

/// Access control view over one offer.
#[derive(Debug, Clone, Copy)]
pub struct AccessControl<'a> {
    offer: &'a Offer,
    admin_cancel_delay_secs: u64,
}

impl<'a> AccessControl<'a> {
    pub fn new(offer: &'a Offer, admin_cancel_delay_secs: u64) -> Self {
        Self {
            offer,
            admin_cancel_delay_secs,
        }
    }

    /// Identity match only, ignoring status. First party wins if the
    /// admin and a party share an address.
    pub fn role_of(&self, sender: &Address) -> Option<Role> {
        if sender == self.offer.first_party() {
            Some(Role::FirstParty)
        } else if self.offer.second_party() == Some(sender) {
            Some(Role::SecondParty)
        } else if *sender == self.offer.routing().admin {
            Some(Role::Admin)
        } else {
            None
        }
    }

    /// Earliest time the admin may cancel. `None` before acceptance.
    pub fn admin_deadline(&self) -> Option<u64> {
        self.offer
            .accepted_at()
            .map(|t| t.saturating_add(self.admin_cancel_delay_secs))
    }

    /// Guard for CANCEL_OFFER on a non-terminal offer.
    pub fn authorize_cancel(&self, sender: &Address, now: u64) -> Result<Role, OfferError> {
        let after_acceptance = self.offer.status() == OfferStatus::WaitConfirm;
        match self.role_of(sender) {
            Some(Role::FirstParty) => Ok(Role::FirstParty),
            Some(Role::SecondParty) if after_acceptance => Ok(Role::SecondParty),
            Some(Role::Admin) if after_acceptance => match self.admin_deadline() {
                Some(deadline) if now >= deadline => Ok(Role::Admin),
                _ => Err(self.reject(sender)),
            },
            _ => Err(self.reject(sender)),
        }
    }

    /// Guard for ACCEPT_OFFER: anyone but the first party.
    pub fn authorize_accept(&self, sender: &Address) -> Result<(), OfferError> {
        if sender == self.offer.first_party() {
            return Err(self.reject(sender));
        }
        Ok(())
    }

    /// Guard for CONFIRM_OFFER: the first party only.
    pub fn authorize_confirm(&self, sender: &Address) -> Result<(), OfferError> {
        if sender != self.offer.first_party() {
            return Err(self.reject(sender));
        }
        Ok(())
    }

    fn reject(&self, sender: &Address) -> OfferError {
        OfferError::InvalidAddress { sender: *sender }
    }
}
