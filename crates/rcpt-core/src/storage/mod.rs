//! Byte storage for submitted documents.

mod fs;

pub use fs::FsStorage;

use crate::error::StorageError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Keeps document bytes and hands out opaque references to them.
pub trait BlobStorage: Send + Sync {
    /// Persist `bytes` submitted under `name`, returning a location reference.
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String>;

    /// Whether the referenced bytes are retrievable.
    fn exists(&self, location_ref: &str) -> bool;

    /// Read the referenced bytes back.
    fn get(&self, location_ref: &str) -> Result<Vec<u8>>;

    /// Delete the referenced bytes. Removing a missing reference is not an error.
    fn remove(&self, location_ref: &str) -> Result<()>;
}
