//! Types library for the NFT swap escrow
//!
//! Core type definitions shared by the offer contract and the simulation
//! sandbox.
//!
//! # Modules
//! - `address`: Standard internal addresses
//! - `coins`: Nano-unit native currency amounts
//! - `offer`: Offer status and party side
//! - `op`: Message operation codes
//! - `fee`: Fee schedule and pool split
//! - `errors`: Exit codes and rejection taxonomy

pub mod address;
pub mod coins;
pub mod offer;
pub mod op;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::address::*;
    pub use crate::coins::*;
    pub use crate::offer::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
