//! Error types for the offer contract
//!
//! Every rejection maps to a numeric exit code surfaced in the transaction
//! result. Rejections never leave partial state behind.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::address::Address;
use crate::coins::Coins;
use crate::offer::OfferStatus;

/// Exit codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    /// Builder exceeded the cell bit or reference limit.
    CellOverflow,
    /// Body ended before a required field.
    CellUnderflow,
    /// Operation not valid in the current status.
    WrongAction,
    /// Attached value insufficient.
    InvalidAmount,
    /// Sender not authorized for the operation in the current status.
    InvalidAddress,
    /// Positional lookup miss.
    DictValueNotFound,
    /// Lookup against an empty collection.
    DictEmpty,
    /// Unrecognized operation code.
    UnknownOp,
}

impl ExitCode {
    pub const fn code(&self) -> u32 {
        match self {
            ExitCode::CellOverflow => 8,
            ExitCode::CellUnderflow => 9,
            ExitCode::WrongAction => 401,
            ExitCode::InvalidAmount => 402,
            ExitCode::InvalidAddress => 403,
            ExitCode::DictValueNotFound => 404,
            ExitCode::DictEmpty => 405,
            ExitCode::UnknownOp => 0xffffff,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Offer contract rejection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OfferError {
    #[error("Action not allowed in status {status}")]
    WrongAction { status: OfferStatus },

    #[error("Insufficient value: required {required}, attached {attached}")]
    InvalidAmount { required: Coins, attached: Coins },

    #[error("Item forwarding budget exceeded: {count} items, max {max}")]
    TooManyItems { count: u32, max: u32 },

    #[error("Insufficient contract balance: required {required}, available {available}")]
    InsufficientBalance { required: Coins, available: Coins },

    #[error("Arithmetic overflow in value calculation")]
    Overflow,

    #[error("Sender {sender} not authorized")]
    InvalidAddress { sender: Address },

    #[error("No item at position {position}")]
    DictValueNotFound { position: u32 },

    #[error("Item collection is empty")]
    DictEmpty,

    #[error("Unknown op: {op:#x}")]
    UnknownOp { op: u32 },

    #[error("Malformed message body: {reason}")]
    Malformed { reason: String },

    #[error("Cell limit exceeded: {reason}")]
    CellOverflow { reason: String },

    #[error("Invalid fee configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl OfferError {
    /// Exit code reported in the failed transaction.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            OfferError::WrongAction { .. } => ExitCode::WrongAction,
            OfferError::InvalidAmount { .. }
            | OfferError::TooManyItems { .. }
            | OfferError::InsufficientBalance { .. }
            | OfferError::Overflow
            | OfferError::InvalidConfig { .. } => ExitCode::InvalidAmount,
            OfferError::InvalidAddress { .. } => ExitCode::InvalidAddress,
            OfferError::DictValueNotFound { .. } => ExitCode::DictValueNotFound,
            OfferError::DictEmpty => ExitCode::DictEmpty,
            OfferError::UnknownOp { .. } => ExitCode::UnknownOp,
            OfferError::Malformed { .. } => ExitCode::CellUnderflow,
            OfferError::CellOverflow { .. } => ExitCode::CellOverflow,
        }
    }
}
