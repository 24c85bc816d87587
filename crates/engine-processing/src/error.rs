use connectors::storage::StorageError;
use engine_core::error::BatchError;
use model::records::record::RecordError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Invalid record for stream '{stream}': {source}")]
    Validation {
        stream: String,
        #[source]
        source: RecordError,
    },

    #[error("Failed to store batch of stream '{stream}' under '{key}': {source}")]
    Persist {
        stream: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error(
        "Retry attempts exhausted for stream '{stream}' after {attempts} attempts, key '{key}': {source}"
    )]
    RetriesExhausted {
        stream: String,
        key: String,
        attempts: usize,
        #[source]
        source: StorageError,
    },

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Stream '{stream}' has failed and accepts no more records")]
    StreamFailed { stream: String },
}
