//! Wire protocol for the relay.
//!
//! This module provides:
//! - Frame header types (tagged JSON records)
//! - Length-prefixed framing codec
//! - Async frame I/O helpers used by server and client

mod codec;
mod header;
mod wire;

pub use codec::Codec;
pub use header::Header;
pub use wire::{read_header, read_payload, write_frame};
