//! Contract-specific error types
//!
//! Codec and configuration failures. Rejections surfaced to callers are
//! `types::errors::OfferError`; codec errors convert into it.

use thiserror::Error;
use types::errors::OfferError;

/// Cell codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("Cell bit overflow: requested {requested}, available {available}")]
    BitOverflow { requested: usize, available: usize },

    #[error("Cell reference overflow")]
    RefOverflow,

    #[error("Cell depth above {max}")]
    DepthOverflow { max: u16 },

    #[error("Cell bit underflow: requested {requested}, remaining {remaining}")]
    BitUnderflow { requested: usize, remaining: usize },

    #[error("Cell reference underflow")]
    RefUnderflow,

    #[error("Value does not fit in {bits} bits")]
    ValueTooLarge { bits: usize },

    #[error("Unsupported address tag: {tag:#04b}")]
    UnsupportedAddress { tag: u8 },

    #[error("Unexpected trailing data: {bits} bits, {refs} refs")]
    TrailingData { bits: usize, refs: usize },

    #[error("Invalid status code: {code}")]
    InvalidStatus { code: u16 },

    #[error("State inconsistent with status {code}: {reason}")]
    InconsistentState { code: u16, reason: &'static str },

    #[error("Item count mismatch: header {declared}, entries {found}")]
    ItemCountMismatch { declared: u32, found: u32 },

    #[error("Unexpected op code: {op:#010x}")]
    UnexpectedOp { op: u32 },
}

impl From<CellError> for OfferError {
    fn from(err: CellError) -> Self {
        match err {
            CellError::BitOverflow { .. }
            | CellError::RefOverflow
            | CellError::DepthOverflow { .. }
            | CellError::ValueTooLarge { .. } => {
                OfferError::CellOverflow {
                    reason: err.to_string(),
                }
            }
            other => OfferError::Malformed {
                reason: other.to_string(),
            },
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

impl From<ConfigError> for OfferError {
    fn from(err: ConfigError) -> Self {
        let reason = match err {
            ConfigError::Invalid { reason } => reason,
            other => other.to_string(),
        };
        OfferError::InvalidConfig { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::errors::ExitCode;

    #[test]
    fn test_cell_error_display() {
        let err = CellError::BitUnderflow {
            requested: 32,
            remaining: 0,
        };
        assert_eq!(err.to_string(), "Cell bit underflow: requested 32, remaining 0");
    }

    #[test]
    fn test_underflow_maps_to_cell_underflow_exit() {
        let err: OfferError = CellError::RefUnderflow.into();
        assert_eq!(err.exit_code(), ExitCode::CellUnderflow);
    }

    #[test]
    fn test_overflow_maps_to_cell_overflow_exit() {
        let err: OfferError = CellError::RefOverflow.into();
        assert_eq!(err.exit_code(), ExitCode::CellOverflow);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            reason: "fee_split_bps above 10000".to_string(),
        };
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_config_error_becomes_rejection() {
        let err: OfferError = ConfigError::Invalid {
            reason: "item_forward_value must be positive".to_string(),
        }
        .into();
        assert_eq!(
            err,
            OfferError::InvalidConfig {
                reason: "item_forward_value must be positive".to_string()
            }
        );
        assert_eq!(err.exit_code(), ExitCode::InvalidAmount);
    }
}
