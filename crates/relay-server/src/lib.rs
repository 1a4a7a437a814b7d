//! relay-server: Broadcast relay for text messages and file payloads.
//!
//! Provides:
//! - Connection registry with broadcast-except-sender delivery
//! - Per-connection session loop (join / message / file semantics)
//! - Upload storage with collision-avoiding filenames
//! - TCP accept loop and CLI

pub mod cli;
pub mod listener;
pub mod registry;
pub mod session;
pub mod storage;

pub use cli::Cli;
pub use listener::{Server, ServerConfig};
pub use registry::{ConnectionId, Peer, Registry};
pub use storage::Storage;
