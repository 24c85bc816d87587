use connectors::{error::ConnectorError, format::FormatError};
use engine_config::error::ConfigError;
use thiserror::Error;

/// Top-level errors of a sink run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    #[error("Failed to emit state message: {0}")]
    StateOutput(#[from] std::io::Error),

    #[error("Failed to encode state message: {0}")]
    StateEncode(#[from] serde_json::Error),

    #[error("Stream '{stream}' would write under '{identifier}', which stream '{owner}' already uses")]
    IdentifierTaken {
        stream: String,
        identifier: String,
        owner: String,
    },

    #[error("Streams failed: {}", .streams.join(", "))]
    StreamsFailed { streams: Vec<String> },
}

/// Failures talking to a stream actor.
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("Mailbox of stream '{0}' is closed")]
    MailboxClosed(String),

    #[error("Actor '{0}' dropped the reply channel")]
    NoReply(String),
}
