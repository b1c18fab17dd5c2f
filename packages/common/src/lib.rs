pub mod storage;

pub use storage::{BoxReader, DiskVault, StorageError};
