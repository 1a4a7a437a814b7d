//! Upload storage.
//!
//! Every accepted `file` frame is persisted exactly once under the upload
//! directory. Incoming names are reduced to their basename before touching
//! the filesystem, and name collisions are resolved by appending the lowest
//! free numeric suffix before the extension (`x.txt`, `x_1.txt`, `x_2.txt`).
//!
//! Payloads are streamed from the socket to disk in bounded chunks rather
//! than buffered whole, while still consuming exactly the declared byte
//! count from the stream.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use relay_core::constants::PAYLOAD_CHUNK_SIZE;
use relay_core::error::{Error, Result};

/// Fallback name when a declared filename has no usable basename.
const FALLBACK_FILENAME: &str = "file.bin";

/// A file persisted by [`Storage::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Name the file was persisted under (collision-resolved basename).
    pub filename: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Byte count, equal to the declared `filesize`.
    pub size: u64,
}

/// The server-local upload directory.
///
/// The directory's contents are never deleted by the server; a partially
/// written file is removed only when its own transfer fails.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open the storage area, creating the directory if missing.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::storage(format!("failed to create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// The storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stream exactly `size` bytes from `reader` into a freshly created file.
    ///
    /// The destination name is the sanitized basename of `declared_name`,
    /// with a numeric suffix when that name is taken. Read failures surface
    /// as [`Error::ConnectionClosed`]/[`Error::Io`], write failures as
    /// [`Error::Storage`]; in either case the partial file is removed.
    pub async fn store<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
        declared_name: &str,
        size: u64,
    ) -> Result<StoredUpload> {
        let safe = sanitize_filename(declared_name);
        let (mut file, filename, path) = self.create_unique(&safe).await?;

        if let Err(e) = copy_to_file(reader, &mut file, size).await {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }

        debug!(file = %path.display(), size, "Stored upload");
        Ok(StoredUpload {
            filename,
            path,
            size,
        })
    }

    /// Create the destination file under the lowest free suffixed name.
    ///
    /// `create_new` makes the existence check and the creation one atomic
    /// step, so two concurrent uploads of the same name cannot land on the
    /// same path.
    async fn create_unique(&self, safe: &str) -> Result<(File, String, PathBuf)> {
        let (stem, ext) = split_name(safe);
        let mut index = 0u32;
        loop {
            let candidate = if index == 0 {
                safe.to_string()
            } else {
                format!("{stem}_{index}{ext}")
            };
            let path = self.root.join(&candidate);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, candidate, path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => index += 1,
                Err(e) => {
                    return Err(Error::storage(format!(
                        "failed to create {}: {e}",
                        path.display()
                    )));
                }
            }
        }
    }
}

/// Copy exactly `size` bytes in bounded chunks, classifying errors by side.
async fn copy_to_file<R: AsyncRead + Unpin>(
    reader: &mut R,
    file: &mut File,
    size: u64,
) -> Result<()> {
    let mut buf = vec![0u8; PAYLOAD_CHUNK_SIZE.min(size.max(1) as usize)];
    let mut remaining = size;
    while remaining > 0 {
        let n = buf.len().min(remaining as usize);
        reader.read_exact(&mut buf[..n]).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ConnectionClosed
            } else {
                Error::Io(e)
            }
        })?;
        file.write_all(&buf[..n])
            .await
            .map_err(|e| Error::storage(format!("write failed: {e}")))?;
        remaining -= n as u64;
    }
    file.sync_all()
        .await
        .map_err(|e| Error::storage(format!("sync failed: {e}")))?;
    Ok(())
}

/// Reduce a declared filename to a bare basename.
///
/// Directory components (either separator style) are stripped; names with
/// no usable basename fall back to a generic one.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    match base {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        name => name.to_string(),
    }
}

/// Split a basename into stem and extension, keeping the dot on the
/// extension. A leading dot does not start an extension.
fn split_name(name: &str) -> (&str, &str) {
    match name[1..].rfind('.') {
        Some(i) => name.split_at(i + 1),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("../../escape.txt"), "escape.txt");
        assert_eq!(sanitize_filename("dir\\sub\\note.md"), "note.md");
        assert_eq!(sanitize_filename("plain.txt"), "plain.txt");
    }

    #[test]
    fn sanitize_falls_back_on_unusable_names() {
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("uploads/"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
    }

    #[test]
    fn split_name_keeps_last_extension() {
        assert_eq!(split_name("x.txt"), ("x", ".txt"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("noext"), ("noext", ""));
        assert_eq!(split_name(".bashrc"), (".bashrc", ""));
    }

    #[tokio::test]
    async fn store_writes_exact_content() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let data: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        let stored = storage
            .store(&mut &data[..], "blob.bin", data.len() as u64)
            .await
            .unwrap();

        assert_eq!(stored.filename, "blob.bin");
        assert_eq!(std::fs::read(&stored.path).unwrap(), data);
    }

    #[tokio::test]
    async fn store_resolves_collisions_with_lowest_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let mut names = Vec::new();
        for byte in [b'a', b'b', b'c'] {
            let data = vec![byte; 10];
            let stored = storage.store(&mut &data[..], "x.txt", 10).await.unwrap();
            names.push(stored.filename);
        }

        assert_eq!(names, ["x.txt", "x_1.txt", "x_2.txt"]);
        assert_eq!(std::fs::read(dir.path().join("x.txt")).unwrap(), vec![b'a'; 10]);
        assert_eq!(std::fs::read(dir.path().join("x_1.txt")).unwrap(), vec![b'b'; 10]);
    }

    #[tokio::test]
    async fn store_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let stored = storage.store(&mut &[][..], "empty.txt", 0).await.unwrap();
        assert_eq!(std::fs::read(&stored.path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn short_read_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        // Declared 1 KiB but the "socket" only delivers 100 bytes.
        let data = vec![0u8; 100];
        let err = storage
            .store(&mut &data[..], "cut.bin", 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
        assert!(!dir.path().join("cut.bin").exists());
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("uploads");
        let storage = Storage::open(&nested).await.unwrap();
        assert!(storage.root().is_dir());
    }
}
