//! Async frame I/O.
//!
//! Blocking-style reads over any `AsyncRead`: a frame is read as exactly 4
//! prefix bytes, exactly the prefixed header length, and (for `file`
//! headers) exactly `filesize` payload bytes. Short reads mean the peer
//! closed mid-frame and surface as [`Error::ConnectionClosed`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::{FRAME_HEADER_LEN, MAX_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::protocol::{Codec, Header};

/// Read exactly `buf.len()` bytes, mapping EOF to [`Error::ConnectionClosed`].
async fn read_exact_or_closed<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ConnectionClosed
        } else {
            Error::Io(e)
        }
    })?;
    Ok(())
}

/// Read one frame header from the stream.
///
/// Does not read any payload bytes; the caller is responsible for consuming
/// exactly [`Header::payload_len`] bytes next.
pub async fn read_header<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Header> {
    let mut prefix = [0u8; FRAME_HEADER_LEN];
    read_exact_or_closed(reader, &mut prefix).await?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_HEADER_SIZE {
        return Err(Error::malformed(format!(
            "header length {len} exceeds maximum {MAX_HEADER_SIZE}"
        )));
    }

    let mut json = vec![0u8; len];
    read_exact_or_closed(reader, &mut json).await?;

    let header: Header = serde_json::from_slice(&json)
        .map_err(|e| Error::malformed(format!("deserialization failed: {e}")))?;
    header.validate()?;
    Ok(header)
}

/// Read exactly `len` payload bytes into memory.
///
/// `len` must already be validated against [`crate::constants::MAX_FILE_SIZE`]
/// (done by [`Header::validate`] on decode).
pub async fn read_payload<R: AsyncRead + Unpin>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut payload).await?;
    Ok(payload)
}

/// Write one frame: length-prefixed header, then the payload if any.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &Header,
    payload: Option<&[u8]>,
) -> Result<()> {
    let encoded = Codec::encode(header)?;
    writer.write_all(&encoded).await?;
    if let Some(payload) = payload {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}
