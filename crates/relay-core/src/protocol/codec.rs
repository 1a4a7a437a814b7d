//! Framing codec for relay headers.
//!
//! Format: 4-byte big-endian length prefix + JSON-encoded header. A `file`
//! header's raw payload follows the header bytes and is NOT covered by the
//! length prefix; framing of the payload relies entirely on the header's
//! declared `filesize`.
//!
//! The codec ensures:
//! - Headers are length-prefixed for stream framing
//! - The length prefix is bounded before any allocation
//! - Partial reads return Ok(None) to support streaming

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::constants::{FRAME_HEADER_LEN, MAX_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::protocol::Header;

/// Codec for length-prefixed JSON encoding of headers.
pub struct Codec;

impl Codec {
    /// Encode a header to bytes, including the 4-byte length prefix.
    pub fn encode(header: &Header) -> Result<Bytes> {
        let json = serde_json::to_vec(header)
            .map_err(|e| Error::malformed(format!("serialization failed: {e}")))?;

        if json.len() > MAX_HEADER_SIZE {
            return Err(Error::malformed(format!(
                "encoded header too large: {} bytes (max {MAX_HEADER_SIZE})",
                json.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + json.len());
        buf.put_u32(json.len() as u32);
        buf.put_slice(&json);
        Ok(buf.freeze())
    }

    /// Decode a header from a buffer.
    ///
    /// Returns:
    /// - Ok(Some(header)) if a complete header was decoded (buffer advanced)
    /// - Ok(None) if more data is needed (buffer unchanged)
    /// - Err if the data is invalid
    ///
    /// The buffer is only consumed on successful decode. Any payload bytes
    /// declared by a `file` header are left in the buffer for the caller.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Header>> {
        if buf.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        // Peek the length without consuming
        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

        // Reject an oversized prefix before waiting for more data
        if len > MAX_HEADER_SIZE {
            return Err(Error::malformed(format!(
                "header length {len} exceeds maximum {MAX_HEADER_SIZE}"
            )));
        }

        if buf.len() < FRAME_HEADER_LEN + len {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_LEN);
        let json = buf.split_to(len);
        let header: Header = serde_json::from_slice(&json)
            .map_err(|e| Error::malformed(format!("deserialization failed: {e}")))?;
        header.validate()?;

        Ok(Some(header))
    }

    /// Decode from a slice (convenience for testing).
    pub fn decode_slice(data: &[u8]) -> Result<Option<Header>> {
        let mut buf = BytesMut::from(data);
        Self::decode(&mut buf)
    }
}
