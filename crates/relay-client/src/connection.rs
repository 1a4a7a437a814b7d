//! Client connection management.
//!
//! A [`ClientConnection`] joins the relay on connect and splits into a
//! sender and a receiver half so sending and receiving can run on separate
//! tasks, mirroring the socket's own split halves.

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

use relay_core::error::Result;
use relay_core::protocol::{Header, read_header, read_payload, write_frame};

/// Something the server relayed to this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Informational server announcement.
    System { text: String },
    /// Chat text from another client.
    Message { username: String, text: String },
    /// File from another client, payload fully read.
    File {
        username: String,
        filename: String,
        data: Vec<u8>,
    },
}

/// An established, joined connection to the relay.
pub struct ClientConnection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl ClientConnection {
    /// Connect to the relay and join under `username`.
    pub async fn connect(addr: SocketAddr, username: &str) -> Result<Self> {
        info!(addr = %addr, username, "Connecting to relay");
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        let mut conn = Self { reader, writer };
        conn.send_header(&Header::Join {
            username: username.into(),
        })
        .await?;
        Ok(conn)
    }

    async fn send_header(&mut self, header: &Header) -> Result<()> {
        write_frame(&mut self.writer, header, None).await
    }

    /// Split into independently usable sender and receiver halves.
    pub fn split(self) -> (ClientSender, ClientReceiver) {
        (
            ClientSender {
                writer: self.writer,
            },
            ClientReceiver {
                reader: self.reader,
            },
        )
    }
}

/// Sending half of a client connection.
pub struct ClientSender {
    writer: OwnedWriteHalf,
}

impl ClientSender {
    /// Re-join under a new display name.
    pub async fn join(&mut self, username: &str) -> Result<()> {
        let header = Header::Join {
            username: username.into(),
        };
        write_frame(&mut self.writer, &header, None).await
    }

    /// Send a chat message.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        let header = Header::Message {
            username: None,
            text: text.into(),
        };
        write_frame(&mut self.writer, &header, None).await
    }

    /// Read a local file and send it as a `file` frame.
    ///
    /// Returns the announced filename and byte count.
    pub async fn send_file(&mut self, path: &Path) -> Result<(String, u64)> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                relay_core::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                ))
            })?;

        let header = Header::File {
            username: None,
            filename: filename.clone(),
            orig_filename: None,
            filesize: data.len() as u64,
        };
        write_frame(&mut self.writer, &header, Some(&data)).await?;
        Ok((filename, data.len() as u64))
    }
}

/// Receiving half of a client connection.
pub struct ClientReceiver {
    reader: OwnedReadHalf,
}

impl ClientReceiver {
    /// Wait for the next relayed event.
    ///
    /// Returns `Ok(None)` when the server closes the connection. File
    /// payloads are always read to completion here so the stream stays
    /// framed even if the caller drops the event.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            let header = match read_header(&mut self.reader).await {
                Ok(header) => header,
                Err(e) if e.is_disconnect() => return Ok(None),
                Err(e) => return Err(e),
            };

            match header {
                Header::System { text } => return Ok(Some(Event::System { text })),
                Header::Message { username, text } => {
                    return Ok(Some(Event::Message {
                        username: username.unwrap_or_else(|| "unknown".into()),
                        text,
                    }));
                }
                Header::File {
                    username,
                    filename,
                    filesize,
                    ..
                } => {
                    let data = read_payload(&mut self.reader, filesize).await?;
                    return Ok(Some(Event::File {
                        username: username.unwrap_or_else(|| "unknown".into()),
                        filename,
                        data,
                    }));
                }
                other => {
                    // The server has no business sending these; skip rather
                    // than surface them to the caller.
                    debug!(kind = other.kind(), "Ignoring unexpected frame from server");
                }
            }
        }
    }
}
