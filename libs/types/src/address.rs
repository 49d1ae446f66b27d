//! Account addresses
//!
//! Standard internal addresses (`addr_std`): an 8-bit workchain id and a 256-bit
//! account hash. The textual form is the raw `workchain:hex` notation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Basechain id used by wallets, items and offer contracts.
pub const BASECHAIN: i8 = 0;

/// Error parsing a raw address string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Missing ':' separator in address {0}")]
    MissingSeparator(String),

    #[error("Invalid workchain: {0}")]
    InvalidWorkchain(String),

    #[error("Invalid account hash: {0}")]
    InvalidHash(String),
}

/// Standard internal address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Derive a deterministic basechain address from a seed string.
    ///
    /// Used by the sandbox to mint wallet and item addresses the way
    /// `treasury("first user")` names them.
    pub fn from_seed(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        Self::new(BASECHAIN, digest.into())
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| AddressParseError::MissingSeparator(s.to_string()))?;

        let workchain = wc
            .parse::<i8>()
            .map_err(|_| AddressParseError::InvalidWorkchain(wc.to_string()))?;

        let bytes =
            hex::decode(hash_hex).map_err(|_| AddressParseError::InvalidHash(hash_hex.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressParseError::InvalidHash(hash_hex.to_string()))?;

        Ok(Self { workchain, hash })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}
