//! Frame header records.
//!
//! A header is a small JSON object tagged by its `type` field. Clients send
//! `join`, `message`, and `file`; the server additionally originates
//! `system`. A `file` header is immediately followed on the wire by exactly
//! `filesize` raw payload bytes, with no delimiter.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_FILE_SIZE;
use crate::error::{Error, Result};

/// One frame header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Header {
    /// Client announces (or changes) its display name.
    Join { username: String },

    /// Chat text. Clients omit `username`; the server stamps the sender's
    /// display name before broadcasting.
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        text: String,
    },

    /// File transfer announcement; `filesize` payload bytes follow.
    ///
    /// In a server-produced broadcast, `filename` is the name the file was
    /// persisted under and `orig_filename` the name the sender requested.
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orig_filename: Option<String>,
        filesize: u64,
    },

    /// Informational text, server-originated only.
    System { text: String },

    /// Catch-all for tags this build does not know. Decodes instead of
    /// failing so the session can answer with a system notice.
    #[serde(other)]
    Unknown,
}

impl Header {
    /// Build a `system` header.
    pub fn system(text: impl Into<String>) -> Self {
        Header::System { text: text.into() }
    }

    /// Short tag name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Header::Join { .. } => "join",
            Header::Message { .. } => "message",
            Header::File { .. } => "file",
            Header::System { .. } => "system",
            Header::Unknown => "unknown",
        }
    }

    /// Number of raw payload bytes that follow this header on the wire.
    pub fn payload_len(&self) -> u64 {
        match self {
            Header::File { filesize, .. } => *filesize,
            _ => 0,
        }
    }

    /// Validate declared sizes before any allocation or read is attempted.
    pub fn validate(&self) -> Result<()> {
        if let Header::File { filesize, .. } = self
            && *filesize > MAX_FILE_SIZE
        {
            return Err(Error::malformed(format!(
                "declared filesize {filesize} exceeds maximum {MAX_FILE_SIZE}"
            )));
        }
        Ok(())
    }
}
