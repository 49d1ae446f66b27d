//! Two-party NFT swap escrow contract
//!
//! One offer per contract instance: the first party deploys with its items
//! and value, a second party accepts with its own, and the first party
//! confirms the swap or either side cancels. All inbound processing is
//! atomic and every amount is an integer count of nano-units.
//!
//! # Modules
//! - `cell`: Bit-level cell builder/slice and representation hash
//! - `items`: 1-based item collections and their wire form
//! - `message`: Inbound op decoding, client bodies, item transfer body
//! - `config`: Fee schedule and admin delay configuration
//! - `storage`: Escrow ledger and persisted layout
//! - `security`: Per-state sender authorization
//! - `engine`: Deposit checks, item fan-out, fee split, settlement
//! - `dispatcher`: Message entry point and state transitions
//! - `getters`: Read-only accessors and named get methods
//! - `events`: Contract events
//! - `errors`: Codec and configuration errors

pub mod cell;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod events;
pub mod getters;
pub mod items;
pub mod message;
pub mod security;
pub mod storage;

/// Contract ABI version: frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";

pub use dispatcher::{MessageContext, OfferContract};
