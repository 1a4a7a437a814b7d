//! Per-connection session loop.
//!
//! One task per accepted connection, driving the state machine
//! Connected -> Joined -> Closed. The loop owns the read half of the socket;
//! the write half lives in a [`Peer`] shared through the registry so other
//! sessions can broadcast to it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tracing::{debug, info, warn};

use relay_core::error::{Error, Result};
use relay_core::protocol::{Header, read_header};

use crate::registry::{ConnectionId, Peer, Registry};
use crate::storage::Storage;

/// Why the session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    /// Peer closed the connection (normal departure).
    PeerClosed,
    /// The stream desynchronized on a malformed frame.
    ProtocolError,
    /// Persisting an upload failed after its bytes were consumed.
    StorageFailed,
    /// A direct reply to this peer could not be written.
    SendFailed,
}

/// Drive one accepted connection until it closes.
///
/// On exit the connection is deregistered unconditionally; a departure
/// announcement goes out only if the session had reached Joined.
pub async fn run_session(
    id: ConnectionId,
    socket: TcpStream,
    addr: SocketAddr,
    registry: Arc<Registry>,
    storage: Arc<Storage>,
) {
    let (mut reader, writer) = socket.into_split();
    let peer = Arc::new(Peer::new(id, addr, writer));

    // Placeholder until the first join frame names this connection.
    let mut name = addr.to_string();
    let mut joined = false;

    let reason = loop {
        let header = match read_header(&mut reader).await {
            Ok(header) => header,
            Err(e) if e.is_disconnect() => break ExitReason::PeerClosed,
            Err(e) => {
                warn!(addr = %addr, error = %e, "Terminating session on decode error");
                break ExitReason::ProtocolError;
            }
        };

        match header {
            Header::Join { username } => {
                name = username;
                registry.register(&peer, &name).await;
                joined = true;
                info!(addr = %addr, name = %name, "Client joined");
                let _ = registry
                    .broadcast_except(id, &Header::system(format!("{name} joined")), None)
                    .await;
            }
            Header::Message { text, .. } => {
                debug!(addr = %addr, name = %name, len = text.len(), "Relaying message");
                let out = Header::Message {
                    username: Some(name.clone()),
                    text,
                };
                let _ = registry.broadcast_except(id, &out, None).await;
            }
            Header::File {
                filename, filesize, ..
            } => {
                if let Err(e) =
                    relay_file(&mut reader, id, &name, filename, filesize, &registry, &storage)
                        .await
                {
                    if e.is_disconnect() {
                        break ExitReason::PeerClosed;
                    }
                    warn!(addr = %addr, error = %e, "Terminating session on file failure");
                    break match e {
                        Error::Storage { .. } => ExitReason::StorageFailed,
                        _ => ExitReason::ProtocolError,
                    };
                }
            }
            Header::System { .. } | Header::Unknown => {
                // Not fatal: notify the sender only and keep the loop alive.
                debug!(addr = %addr, kind = header.kind(), "Unrecognized frame type");
                let notice = Header::system("unsupported message type");
                if peer.send(&notice, None).await.is_err() {
                    break ExitReason::SendFailed;
                }
            }
        }
    };

    registry.deregister(id).await;
    if joined {
        let _ = registry
            .broadcast_except(id, &Header::system(format!("{name} left")), None)
            .await;
    }

    info!(addr = %addr, name = %name, reason = ?reason, "Session closed");
}

/// Receive one file payload, persist it, and fan it out.
///
/// The declared byte count is consumed from the stream before anything else
/// can fail, so a storage error leaves nothing useful to salvage: the caller
/// terminates the session rather than silently dropping the broadcast.
async fn relay_file(
    reader: &mut OwnedReadHalf,
    id: ConnectionId,
    name: &str,
    requested_name: String,
    filesize: u64,
    registry: &Registry,
    storage: &Storage,
) -> Result<()> {
    let stored = storage.store(reader, &requested_name, filesize).await?;
    let payload = tokio::fs::read(&stored.path)
        .await
        .map_err(|e| Error::storage(format!("failed to read back stored upload: {e}")))?;

    info!(
        name = %name,
        file = %stored.path.display(),
        size = filesize,
        "Stored uploaded file"
    );

    let out = Header::File {
        username: Some(name.to_string()),
        filename: stored.filename,
        orig_filename: Some(requested_name),
        filesize,
    };
    registry.broadcast_except(id, &out, Some(&payload)).await
}
