//! Native-currency amounts
//!
//! All value is carried as an unsigned integer count of nano-units
//! (1 unit = 10^9 nano). Whole-unit decimal strings such as `"0.05"` are parsed
//! exactly through `rust_decimal`; fractions below one nano are rejected rather
//! than rounded.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Nano-units per whole unit.
pub const NANO_PER_UNIT: u128 = 1_000_000_000;

/// Largest amount representable in a `VarUInteger 16` field (15 bytes).
pub const MAX_COINS: u128 = (1u128 << 120) - 1;

/// Basis-point denominator for proportional splits.
pub const BPS_DENOMINATOR: u128 = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinsParseError {
    #[error("Invalid decimal amount: {0}")]
    InvalidDecimal(String),

    #[error("Amount must not be negative: {0}")]
    Negative(String),

    #[error("Amount has precision below one nano-unit: {0}")]
    SubNano(String),

    #[error("Amount exceeds the coins range: {0}")]
    OutOfRange(String),
}

/// An amount of native currency in nano-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coins(u128);

impl Coins {
    pub const ZERO: Coins = Coins(0);

    pub const fn from_nano(nano: u128) -> Self {
        Self(nano)
    }

    /// Whole units, e.g. `Coins::from_units(100)` is 100 * 10^9 nano.
    pub const fn from_units(units: u64) -> Self {
        Self(units as u128 * NANO_PER_UNIT)
    }

    pub const fn nano(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Exact conversion from a whole-unit decimal.
    pub fn from_decimal(units: Decimal) -> Result<Self, CoinsParseError> {
        if units.is_sign_negative() && !units.is_zero() {
            return Err(CoinsParseError::Negative(units.to_string()));
        }
        let scaled = units
            .checked_mul(Decimal::from(NANO_PER_UNIT as u64))
            .ok_or_else(|| CoinsParseError::OutOfRange(units.to_string()))?;
        if !scaled.fract().is_zero() {
            return Err(CoinsParseError::SubNano(units.to_string()));
        }
        let nano = scaled
            .trunc()
            .to_u128()
            .filter(|n| *n <= MAX_COINS)
            .ok_or_else(|| CoinsParseError::OutOfRange(units.to_string()))?;
        Ok(Self(nano))
    }

    /// Whole-unit decimal view, `None` if the amount exceeds `Decimal` precision.
    pub fn to_decimal(&self) -> Option<Decimal> {
        i128::try_from(self.0)
            .ok()
            .and_then(|n| Decimal::try_from_i128_with_scale(n, 9).ok())
            .map(|d| d.normalize())
    }

    pub fn checked_add(self, rhs: Coins) -> Option<Coins> {
        self.0.checked_add(rhs.0).map(Coins)
    }

    pub fn checked_sub(self, rhs: Coins) -> Option<Coins> {
        self.0.checked_sub(rhs.0).map(Coins)
    }

    pub fn saturating_sub(self, rhs: Coins) -> Coins {
        Coins(self.0.saturating_sub(rhs.0))
    }

    /// Total of `amounts`, `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Coins>>(amounts: I) -> Option<Coins> {
        amounts.into_iter().try_fold(Coins::ZERO, Coins::checked_add)
    }

    /// `self * count`, used for per-item forwarding budgets.
    pub fn checked_mul(self, count: u32) -> Option<Coins> {
        self.0.checked_mul(count as u128).map(Coins)
    }

    /// Floor of `self * bps / 10_000`.
    pub fn bps_share(self, bps: u16) -> Option<Coins> {
        self.0
            .checked_mul(bps as u128)
            .map(|v| Coins(v / BPS_DENOMINATOR))
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / NANO_PER_UNIT;
        let frac = self.0 % NANO_PER_UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:09}", frac);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl FromStr for Coins {
    type Err = CoinsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let units = Decimal::from_str_exact(s.trim())
            .map_err(|_| CoinsParseError::InvalidDecimal(s.to_string()))?;
        Self::from_decimal(units)
    }
}

impl TryFrom<String> for Coins {
    type Error = CoinsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coins> for String {
    fn from(c: Coins) -> Self {
        c.to_string()
    }
}
