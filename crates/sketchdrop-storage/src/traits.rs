//! Storage abstraction trait

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content store for normalized submission images.
///
/// Keys are flat filenames (`{uuid}.png`). Each file is written exactly once
/// per accepted submission and is immutable afterwards; nothing in the
/// request path ever reads one back. `exists` is the liveness probe used by
/// the health endpoint.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a file under the given key, returning the key on success.
    async fn upload(&self, key: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Check whether a file exists for the given key.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
