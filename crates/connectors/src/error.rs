use crate::{format::FormatError, storage::StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Serialization of a batch failed.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Writing an artifact failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The storage client could not be built from the given settings.
    #[error("Invalid storage configuration: {0}")]
    Config(String),

    /// Reading upstream input failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// An upstream line is not a valid message.
    #[error("Invalid message on line {line}: {reason}")]
    InvalidMessage { line: usize, reason: String },
}
