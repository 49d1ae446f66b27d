//! Read-Only Accessors: off-chain queries against a deployed offer
//!
//! Typed accessors plus the named get-method interface clients call by
//! string (`get_status`, `get_smc_balance`,
//! `get_creator_nft_address_by_index`, `get_user_nft_address_by_index`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::address::Address;
use types::coins::Coins;
use types::errors::OfferError;
use types::offer::{OfferStatus, Side};

use crate::dispatcher::OfferContract;

/// Named get methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GetMethod {
    Status,
    SmcBalance,
    /// Item of the first party at a 1-based position.
    CreatorNftAddressByIndex,
    /// Item of the second party at a 1-based position.
    UserNftAddressByIndex,
}

impl GetMethod {
    pub const fn name(&self) -> &'static str {
        match self {
            GetMethod::Status => "get_status",
            GetMethod::SmcBalance => "get_smc_balance",
            GetMethod::CreatorNftAddressByIndex => "get_creator_nft_address_by_index",
            GetMethod::UserNftAddressByIndex => "get_user_nft_address_by_index",
        }
    }

    const fn arity(&self) -> usize {
        match self {
            GetMethod::Status | GetMethod::SmcBalance => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for GetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GetMethod {
    type Err = GetMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_status" => Ok(GetMethod::Status),
            "get_smc_balance" => Ok(GetMethod::SmcBalance),
            "get_creator_nft_address_by_index" => Ok(GetMethod::CreatorNftAddressByIndex),
            "get_user_nft_address_by_index" => Ok(GetMethod::UserNftAddressByIndex),
            other => Err(GetMethodError::Unknown {
                name: other.to_string(),
            }),
        }
    }
}

/// Value on the get-method result stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackValue {
    Int(u128),
    Address(Address),
}

impl StackValue {
    pub fn as_int(&self) -> Option<u128> {
        match self {
            StackValue::Int(v) => Some(*v),
            StackValue::Address(_) => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            StackValue::Address(a) => Some(a),
            StackValue::Int(_) => None,
        }
    }
}

/// Get-method failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GetMethodError {
    #[error("Unknown get method: {name}")]
    Unknown { name: String },

    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: GetMethod,
        expected: usize,
        got: usize,
    },

    #[error("Get method failed: {0}")]
    Failed(#[from] OfferError),
}

impl OfferContract {
    pub fn get_status(&self) -> OfferStatus {
        self.offer().status()
    }

    pub fn get_balance(&self) -> Coins {
        self.balance()
    }

    pub fn get_item_at(&self, side: Side, position: u32) -> Result<Address, OfferError> {
        self.offer().get_item_at(side, position)
    }

    /// Run a get method by name with integer arguments.
    pub fn run_get_method(&self, name: &str, args: &[u64]) -> Result<StackValue, GetMethodError> {
        let method: GetMethod = name.parse()?;
        if args.len() != method.arity() {
            return Err(GetMethodError::Arity {
                method,
                expected: method.arity(),
                got: args.len(),
            });
        }

        let value = match method {
            GetMethod::Status => StackValue::Int(self.get_status().code() as u128),
            GetMethod::SmcBalance => StackValue::Int(self.get_balance().nano()),
            GetMethod::CreatorNftAddressByIndex => {
                StackValue::Address(self.item_at_index(Side::First, args[0])?)
            }
            GetMethod::UserNftAddressByIndex => {
                StackValue::Address(self.item_at_index(Side::Second, args[0])?)
            }
        };
        Ok(value)
    }

    /// Lookup by a raw stack index. An empty side is `DictEmpty` whatever
    /// the index; an index past `u32` is a miss.
    fn item_at_index(&self, side: Side, index: u64) -> Result<Address, OfferError> {
        if self.offer().items(side).is_empty() {
            return Err(OfferError::DictEmpty);
        }
        let position = u32::try_from(index)
            .map_err(|_| OfferError::DictValueNotFound { position: u32::MAX })?;
        self.get_item_at(side, position)
    }
}
