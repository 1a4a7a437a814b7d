//! relay-core: Shared library for the relay wire protocol.
//!
//! This crate provides:
//! - Frame header definitions and the length-prefixed JSON codec
//! - Async frame I/O over any `AsyncRead`/`AsyncWrite`
//! - The error taxonomy shared by server and client
//! - Logging setup

pub mod constants;
pub mod error;
pub mod logging;
pub mod protocol;

pub use error::{Error, Result};
pub use logging::{LogFormat, init_logging};
