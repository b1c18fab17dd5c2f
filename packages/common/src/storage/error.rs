use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file exists at the requested path.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// A file already exists at the target path. Paths are keyed by a fresh
    /// random identifier, so this indicates a collision and is never
    /// resolved by overwriting.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The blob exceeds the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
