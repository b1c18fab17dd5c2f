use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use super::BoxReader;
use super::error::StorageError;

/// Removes a partially-written file unless disarmed, including when the
/// surrounding write future is dropped by a cancelled request.
struct PartialFileGuard<'a> {
    path: &'a Path,
    armed: bool,
}

impl Drop for PartialFileGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(self.path);
        }
    }
}

/// Filesystem-backed blob vault.
///
/// Blobs are stored one file per upload in a date-partitioned layout:
/// `{base_dir}/{YYYY-MM-DD}/{uuid}.{ext}`
pub struct DiskVault {
    base_dir: PathBuf,
    max_size: u64,
}

impl DiskVault {
    /// Create a new vault rooted at `base_dir`, creating the root if absent.
    pub async fn new(base_dir: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir, max_size })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compute the storage path for a blob and create its date directory.
    ///
    /// Directory creation is idempotent; an already-existing date directory
    /// is not an error, so concurrent uploads on the same day are safe.
    pub async fn allocate(
        &self,
        date: NaiveDate,
        id: Uuid,
        ext: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(date.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir).await?;
        Ok(dir.join(format!("{id}.{ext}")))
    }

    /// Stream `reader` to `path` and return the number of bytes written.
    ///
    /// The target is opened with exclusive create: a pre-existing file at
    /// `path` is a fatal collision, never silently overwritten. If the write
    /// does not run to completion, whether through an I/O error, the size
    /// limit, or the caller's future being dropped mid-copy, the partial
    /// file is removed.
    pub async fn write_stream<R>(&self, mut reader: R, path: &Path) -> Result<u64, StorageError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut guard = PartialFileGuard { path, armed: true };

        let mut total: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total,
                    limit: self.max_size,
                });
            }

            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        guard.armed = false;
        Ok(total)
    }

    /// Open a stored blob as a streaming async reader.
    pub async fn open_stream(&self, path: &Path) -> Result<BoxReader, StorageError> {
        match fs::File::open(path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    pub async fn remove(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the size of a stored blob in bytes.
    pub async fn file_size(&self, path: &Path) -> Result<u64, StorageError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
