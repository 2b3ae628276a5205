//! Durable key-value storage backends.
//!
//! The session store persists its state through a [`StorageBackend`], a
//! capability-checked abstraction over a per-deployment key-value store.
//! The backend is selected once at construction time:
//!
//! - [`FileStorage`]: one JSON document per key under a data directory
//! - [`NullStorage`]: the "no durable storage" branch; reads come back
//!   empty and writes are silently skipped
//!
//! Writes are read-then-write with no cross-process locking: two
//! processes sharing a data directory race, and the last writer wins.

pub mod file;
pub mod null;

pub use file::FileStorage;
pub use null::NullStorage;

use async_trait::async_trait;

/// Key holding the registered user list (JSON array of user records).
pub const USERS_KEY: &str = "mock-users";

/// Key holding the current session record, absent when signed out.
pub const SESSION_KEY: &str = "mock-session";

/// Error raised by storage backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure while touching the backing store.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A durable key-value store.
///
/// All methods take string keys and string values; callers are
/// responsible for serialization. Absent keys read as `None`.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Whether this backend actually persists anything.
    ///
    /// When `false`, reads return `None` and writes/removes succeed
    /// without doing anything.
    fn is_available(&self) -> bool;

    /// Read the value stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is
    /// not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
