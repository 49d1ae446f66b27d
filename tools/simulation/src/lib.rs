//! Swap Sandbox
//!
//! Deterministic in-memory chain for exercising swap offers end to end:
//! wallets, NFT items and offer contracts exchange messages in FIFO order,
//! and every transaction is recorded for inspection.
//!
//! # Modules
//! - `chain`: Blockchain sandbox: wallets, clock, message delivery, bounces
//! - `nft`: NFT items with TEP-62 transfer semantics
//! - `transaction`: Transaction records and filters
//! - `fixtures`: Offer setup helpers (mint, deploy, accept batches)
//! - `scenario`: Seeded random offer traffic with invariant checks

pub mod chain;
pub mod fixtures;
pub mod nft;
pub mod scenario;
pub mod transaction;

pub use chain::{Blockchain, SimError};
pub use transaction::{SendResult, Transaction, TxFilter};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
