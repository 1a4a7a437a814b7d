//! Error types for relay-core.

use thiserror::Error;

/// Main error type for relay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection (or the network failed mid-read).
    #[error("connection closed")]
    ConnectionClosed,

    /// Header bytes could not be interpreted as a valid frame header, or a
    /// declared length is out of bounds. Fatal to the session: a framed
    /// stream cannot be resynchronized after this.
    #[error("malformed header: {message}")]
    MalformedHeader { message: String },

    /// Persisting an uploaded file failed (disk full, permissions, ...).
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl Error {
    /// Shorthand for a [`Error::MalformedHeader`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedHeader {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// Returns true if this error means the peer went away, as opposed to a
    /// protocol or local failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Convenience result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;
