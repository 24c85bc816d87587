use async_trait::async_trait;
use bytes::Bytes;
use model::core::identifiers::StorageKey;

pub mod error;
pub mod object;

pub use error::StorageError;

/// Destination of finished artifacts.
///
/// One call is one attempt. An artifact is either stored completely under
/// its key or not at all, and storing the same bytes under the same key
/// again is harmless.
#[async_trait]
pub trait StorageSink: Send + Sync {
    async fn persist(&self, key: &StorageKey, body: Bytes) -> Result<(), StorageError>;

    /// Short description for logs, such as `s3://bucket`.
    fn describe(&self) -> String;
}
