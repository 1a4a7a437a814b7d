//! TCP accept loop.
//!
//! The listener is a single long-lived task that blocks only on the next
//! incoming connection; each accepted socket gets its own spawned session
//! task. Shutdown closes the listening socket and lets in-flight sessions
//! drain naturally.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info};

use relay_core::constants::{DEFAULT_PORT, DEFAULT_UPLOAD_DIR};
use relay_core::error::Result;

use crate::registry::{ConnectionId, Registry};
use crate::session::run_session;
use crate::storage::Storage;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,
    /// Directory uploaded files are persisted under.
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

/// The relay server: one registry, one storage area, one accept loop.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<Registry>,
    storage: Arc<Storage>,
}

impl Server {
    /// Bind the listening socket and open the storage area.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let storage = Arc::new(Storage::open(config.upload_dir).await?);
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            registry: Arc::new(Registry::new()),
            storage,
        })
    }

    /// Address the listener is bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the connection registry.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Run the accept loop forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the accept loop until `shutdown` resolves.
    ///
    /// Returning drops the listening socket; sessions already accepted keep
    /// running on their own tasks until their peers disconnect.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(addr = %self.local_addr, uploads = %self.storage.root().display(), "Server listening");

        tokio::pin!(shutdown);
        let mut next_id: ConnectionId = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received, closing listener");
                    break;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((socket, addr)) => {
                        next_id += 1;
                        let id = next_id;
                        info!(addr = %addr, id, "New connection");
                        tokio::spawn(run_session(
                            id,
                            socket,
                            addr,
                            Arc::clone(&self.registry),
                            Arc::clone(&self.storage),
                        ));
                    }
                    Err(e) => {
                        // Transient accept failures (EMFILE etc.) should not
                        // take the server down.
                        debug!(error = %e, "Accept error");
                    }
                },
            }
        }

        Ok(())
    }
}
