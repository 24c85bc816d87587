use connectors::{format::FormatError, storage::StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    /// A sealed batch has not been stored yet; it must be drained first.
    #[error("Stream '{stream}' has a sealed batch waiting to be stored")]
    DrainPending { stream: String },

    #[error("Failed to serialize batch {sequence} of stream '{stream}': {source}")]
    Format {
        stream: String,
        sequence: u64,
        #[source]
        source: FormatError,
    },

    /// A sealed batch could not be serialized; its records are kept and the
    /// stream takes no more.
    #[error("Stream '{stream}' holds batch {sequence} that could not be serialized")]
    Rejected { stream: String, sequence: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
