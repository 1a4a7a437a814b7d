//! Client library tests against an in-process relay server.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use relay_client::{ClientConnection, ClientReceiver, Event};
use relay_server::{Registry, Server, ServerConfig};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct TestServer {
    addr: std::net::SocketAddr,
    registry: Arc<Registry>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::bind(ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            upload_dir: dir.path().join("uploads"),
        })
        .await
        .unwrap();
        let addr = server.local_addr();
        let registry = server.registry();
        tokio::spawn(server.run());
        Self {
            addr,
            registry,
            _dir: dir,
        }
    }

    /// Connect and wait until the server has processed the join.
    async fn join(&self, username: &str, expected_len: usize) -> ClientConnection {
        let conn = ClientConnection::connect(self.addr, username).await.unwrap();
        timeout(RECV_TIMEOUT, async {
            while self.registry.len().await != expected_len {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("registry never reached expected size");
        conn
    }

    fn upload_dir(&self) -> std::path::PathBuf {
        self._dir.path().join("uploads")
    }

    fn scratch_dir(&self) -> &std::path::Path {
        self._dir.path()
    }
}

async fn next(receiver: &mut ClientReceiver) -> Event {
    timeout(RECV_TIMEOUT, receiver.next_event())
        .await
        .expect("timed out waiting for an event")
        .unwrap()
        .expect("connection closed unexpectedly")
}

#[tokio::test]
async fn clients_exchange_messages() {
    let server = TestServer::spawn().await;

    let alice = server.join("alice", 1).await;
    let (mut alice_tx, mut alice_rx) = alice.split();

    let bob = server.join("bob", 2).await;
    let (mut bob_tx, mut bob_rx) = bob.split();

    assert_eq!(
        next(&mut alice_rx).await,
        Event::System {
            text: "bob joined".into()
        }
    );

    alice_tx.send_text("hello bob").await.unwrap();
    assert_eq!(
        next(&mut bob_rx).await,
        Event::Message {
            username: "alice".into(),
            text: "hello bob".into()
        }
    );

    bob_tx.send_text("hello alice").await.unwrap();
    assert_eq!(
        next(&mut alice_rx).await,
        Event::Message {
            username: "bob".into(),
            text: "hello alice".into()
        }
    );
}

#[tokio::test]
async fn file_event_carries_exact_bytes() {
    let server = TestServer::spawn().await;

    let alice = server.join("alice", 1).await;
    let (mut alice_tx, mut alice_rx) = alice.split();
    let bob = server.join("bob", 2).await;
    let (_bob_tx, mut bob_rx) = bob.split();
    assert!(matches!(next(&mut alice_rx).await, Event::System { .. }));

    let content: Vec<u8> = (0..4096u32).map(|i| (i % 89) as u8).collect();
    let src = server.scratch_dir().join("notes.bin");
    std::fs::write(&src, &content).unwrap();

    let (name, size) = alice_tx.send_file(&src).await.unwrap();
    assert_eq!(name, "notes.bin");
    assert_eq!(size, content.len() as u64);

    match next(&mut bob_rx).await {
        Event::File {
            username,
            filename,
            data,
        } => {
            assert_eq!(username, "alice");
            assert_eq!(filename, "notes.bin");
            assert_eq!(data, content);
        }
        other => panic!("expected file event, got {other:?}"),
    }

    // The relay keeps its own copy.
    assert_eq!(
        std::fs::read(server.upload_dir().join("notes.bin")).unwrap(),
        content
    );
}

#[tokio::test]
async fn rejoin_changes_broadcast_name() {
    let server = TestServer::spawn().await;

    let alice = server.join("alice", 1).await;
    let (mut alice_tx, _alice_rx) = alice.split();
    let bob = server.join("bob", 2).await;
    let (_bob_tx, mut bob_rx) = bob.split();

    alice_tx.join("alicia").await.unwrap();
    assert_eq!(
        next(&mut bob_rx).await,
        Event::System {
            text: "alicia joined".into()
        }
    );

    alice_tx.send_text("renamed").await.unwrap();
    assert_eq!(
        next(&mut bob_rx).await,
        Event::Message {
            username: "alicia".into(),
            text: "renamed".into()
        }
    );
}

#[tokio::test]
async fn departure_is_announced_then_stream_ends() {
    let server = TestServer::spawn().await;

    let alice = server.join("alice", 1).await;
    let bob = server.join("bob", 2).await;
    let (bob_tx, mut bob_rx) = bob.split();

    drop(alice);
    assert_eq!(
        next(&mut bob_rx).await,
        Event::System {
            text: "alice left".into()
        }
    );

    // Closing our write half makes the server tear the session down, which
    // ends the receive stream cleanly.
    drop(bob_tx);
    assert_eq!(
        timeout(RECV_TIMEOUT, bob_rx.next_event())
            .await
            .unwrap()
            .unwrap(),
        None
    );
}
