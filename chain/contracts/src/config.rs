//! Contract configuration
//!
//! Fee constants and the admin cancellation delay, fixed when an offer is
//! deployed. Amounts are written in whole units as decimal strings:
//!
//! ```json
//! {
//!   "fees": {
//!     "tx_fee": "0.5",
//!     "service_fee": "0.1",
//!     "item_forward_value": "0.05",
//!     "fee_split_bps": 3000
//!   },
//!   "admin_cancel_delay_secs": 86400
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use types::coins::BPS_DENOMINATOR;
use types::fee::FeeSchedule;

use crate::errors::ConfigError;

/// Default delay after acceptance before the admin may cancel (24h).
pub const DEFAULT_ADMIN_CANCEL_DELAY_SECS: u64 = 86_400;

/// Immutable contract configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default)]
    pub fees: FeeSchedule,
    /// Seconds after acceptance before `admin_address` may cancel.
    #[serde(default = "default_admin_cancel_delay")]
    pub admin_cancel_delay_secs: u64,
}

fn default_admin_cancel_delay() -> u64 {
    DEFAULT_ADMIN_CANCEL_DELAY_SECS
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            admin_cancel_delay_secs: DEFAULT_ADMIN_CANCEL_DELAY_SECS,
        }
    }
}

impl ContractConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ContractConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fees = &self.fees;
        if fees.fee_split_bps as u128 > BPS_DENOMINATOR {
            return Err(ConfigError::Invalid {
                reason: format!("fee_split_bps {} above {}", fees.fee_split_bps, BPS_DENOMINATOR),
            });
        }
        if fees.item_forward_value.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "item_forward_value must be positive".to_string(),
            });
        }
        if fees.item_forward_value > fees.tx_fee {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "item_forward_value {} exceeds tx_fee {}",
                    fees.item_forward_value, fees.tx_fee
                ),
            });
        }
        if fees.total_fee().is_none() {
            return Err(ConfigError::Invalid {
                reason: "total fee overflows".to_string(),
            });
        }
        Ok(())
    }
}
