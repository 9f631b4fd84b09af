//! Storage abstraction for persistence.
//!
//! Backends map string keys to JSON documents. [`ScenePersistence`] layers
//! the scene and clipboard slots on top of any backend.

mod file;
mod memory;
mod persistence;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistence::{CLIPBOARD_KEY, DEFAULT_AUTOSAVE_INTERVAL_SECS, ELEMENTS_KEY, ScenePersistence};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Key-value store of JSON documents.
///
/// Implementations can keep documents in memory or on the filesystem.
pub trait Storage: Send + Sync {
    /// Save a document under `key`, replacing any previous value.
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the document stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;

    /// Delete a document. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
