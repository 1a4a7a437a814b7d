//! Protocol and configuration constants for the relay.

// =============================================================================
// Protocol Constants
// =============================================================================

/// Length of the frame length prefix (4 bytes, big-endian u32).
pub const FRAME_HEADER_LEN: usize = 4;

/// Maximum encoded header size (64 KiB).
///
/// A length prefix above this is treated as a framing error rather than an
/// allocation request.
pub const MAX_HEADER_SIZE: usize = 64 * 1024;

/// Maximum declared file payload size (512 MiB).
pub const MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Chunk size for streaming file payloads between socket and disk.
pub const PAYLOAD_CHUNK_SIZE: usize = 64 * 1024;

// =============================================================================
// Default Values
// =============================================================================

/// Default port the relay server listens on.
pub const DEFAULT_PORT: u16 = 9009;

/// Default directory for files uploaded to the server.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default directory where the client saves received files.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
