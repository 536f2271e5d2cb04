//! Card locations and movement.
//!
//! ## Key Types
//!
//! - `Zone`: A named location (deck, hand, lane, support slot, discard, stack, removed)
//! - `CardRef`: Picks a card by definition id or by instance id
//! - `transfer`: The single primitive that moves a card
//! - `board`: Upkeep when creatures and support cards leave the field

pub mod board;
pub mod transfer;

pub use board::{destroy_creature, discard_support, release_target, return_to_hand, Destroyed};
pub use transfer::{transfer, CardRef, Zone};
