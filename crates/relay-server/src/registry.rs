//! Connection registry for the relay server.
//!
//! The registry is the single point of truth for which connections are
//! currently present. It is an explicitly owned object shared between the
//! accept loop and every session task, never global state.
//!
//! Locking discipline: the registry mutex guards only membership bookkeeping
//! and the iteration snapshot taken for a broadcast. Network sends happen
//! outside the registry lock, against each peer's own writer lock, so one
//! slow recipient cannot stall membership changes or a snapshot.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use relay_core::error::Result;
use relay_core::protocol::{Codec, Header};

/// Identifier assigned to a connection by the accept loop.
pub type ConnectionId = u64;

/// The write side of one accepted connection.
///
/// Owned by its session loop for lifecycle purposes, shared with every other
/// session through the registry for broadcast writes. The writer mutex keeps
/// a header and its payload contiguous on the wire when broadcasts from
/// different senders land on the same recipient concurrently.
pub struct Peer {
    id: ConnectionId,
    addr: SocketAddr,
    writer: Mutex<OwnedWriteHalf>,
}

impl Peer {
    /// Wrap the write half of an accepted socket.
    pub fn new(id: ConnectionId, addr: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            addr,
            writer: Mutex::new(writer),
        }
    }

    /// Connection identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Peer socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Write one already-encoded frame, then the payload if any.
    async fn send_bytes(&self, frame: &Bytes, payload: Option<&[u8]>) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        if let Some(payload) = payload {
            writer.write_all(payload).await?;
        }
        writer.flush().await?;
        Ok(())
    }

    /// Encode and send a single frame to this peer only.
    ///
    /// Used for direct replies (e.g. the system notice for an unrecognized
    /// frame type); broadcasts go through [`Registry::broadcast_except`].
    pub async fn send(&self, header: &Header, payload: Option<&[u8]>) -> Result<()> {
        let frame = Codec::encode(header)?;
        self.send_bytes(&frame, payload).await
    }
}

struct Entry {
    name: String,
    peer: Arc<Peer>,
}

/// The set of currently joined connections.
pub struct Registry {
    peers: Mutex<HashMap<ConnectionId, Entry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Add a connection under its display name.
    ///
    /// Idempotent per connection: a repeated join from the same connection
    /// updates the stored name in place instead of duplicating the entry.
    pub async fn register(&self, peer: &Arc<Peer>, name: &str) {
        let mut peers = self.peers.lock().await;
        peers
            .entry(peer.id())
            .and_modify(|entry| entry.name = name.to_string())
            .or_insert_with(|| Entry {
                name: name.to_string(),
                peer: Arc::clone(peer),
            });
    }

    /// Remove a connection. No-op if it was never registered.
    pub async fn deregister(&self, id: ConnectionId) -> bool {
        self.peers.lock().await.remove(&id).is_some()
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    /// True when no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }

    /// Display name a connection is registered under, if present.
    pub async fn display_name(&self, id: ConnectionId) -> Option<String> {
        self.peers.lock().await.get(&id).map(|e| e.name.clone())
    }

    /// Send a frame to every registered connection except `sender`.
    ///
    /// Delivery is best-effort: a recipient whose socket write fails is
    /// removed from the registry after the pass completes, without aborting
    /// delivery to the rest and without surfacing anything to the sender.
    /// Sends run concurrently so a slow recipient does not delay the others.
    pub async fn broadcast_except(
        &self,
        sender: ConnectionId,
        header: &Header,
        payload: Option<&[u8]>,
    ) -> Result<()> {
        let frame = Codec::encode(header)?;

        let targets: Vec<Arc<Peer>> = {
            let peers = self.peers.lock().await;
            peers
                .values()
                .filter(|entry| entry.peer.id() != sender)
                .map(|entry| Arc::clone(&entry.peer))
                .collect()
        };

        let sends = targets.iter().map(|peer| {
            let frame = frame.clone();
            async move {
                match peer.send_bytes(&frame, payload).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(peer = %peer.addr(), error = %e, "Broadcast send failed");
                        Some(peer.id())
                    }
                }
            }
        });
        let dead: Vec<ConnectionId> = futures::future::join_all(sends)
            .await
            .into_iter()
            .flatten()
            .collect();

        if !dead.is_empty() {
            let mut peers = self.peers.lock().await;
            for id in dead {
                if peers.remove(&id).is_some() {
                    debug!(id, "Removed dead connection after failed broadcast");
                }
            }
        }

        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
