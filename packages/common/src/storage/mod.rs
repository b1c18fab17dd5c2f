mod disk;
mod error;

use tokio::io::AsyncRead;

pub use disk::DiskVault;
pub use error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;
