//! Operation codes carried in the first 32 bits of a message body.

/// Cancel the offer and return all escrowed items and value.
pub const CANCEL_OFFER: u32 = 1;
/// Become the second party by depositing value and declaring items.
pub const ACCEPT_OFFER: u32 = 2;
/// First party confirms; items are swapped and fees distributed.
pub const CONFIRM_OFFER: u32 = 3;

/// NFT item transfer (TEP-62).
pub const NFT_TRANSFER: u32 = 0x5fcc3d14;
/// Sent by an item to its new owner when `forward_amount > 0`.
pub const OWNERSHIP_ASSIGNED: u32 = 0x0513_8d91;
/// Surplus value returned to a transfer's response destination.
pub const EXCESSES: u32 = 0xd532_76db;

/// Human-readable name for logs.
pub fn name(op: u32) -> &'static str {
    match op {
        CANCEL_OFFER => "cancel_offer",
        ACCEPT_OFFER => "accept_offer",
        CONFIRM_OFFER => "confirm_offer",
        NFT_TRANSFER => "nft_transfer",
        OWNERSHIP_ASSIGNED => "ownership_assigned",
        EXCESSES => "excesses",
        _ => "unknown",
    }
}
