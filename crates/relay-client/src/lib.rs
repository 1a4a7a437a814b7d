//! relay-client: Thin protocol consumer for the relay server.
//!
//! Provides:
//! - CLI argument parsing
//! - Connection helper (join, send text/files, receive events)

pub mod cli;
pub mod connection;

pub use cli::Cli;
pub use connection::{ClientConnection, ClientReceiver, ClientSender, Event};
