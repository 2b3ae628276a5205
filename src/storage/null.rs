//! No-op storage for environments without a durable store.

use async_trait::async_trait;

use super::{StorageBackend, StorageError};

/// Backend used when no durable storage facility exists.
///
/// Every read answers `None`, and writes and removes succeed without
/// persisting anything. Components check [`StorageBackend::is_available`]
/// before operations that require durability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

#[async_trait]
impl StorageBackend for NullStorage {
    fn is_available(&self) -> bool {
        false
    }

    async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
