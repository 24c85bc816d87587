use crate::error::ConnectorError;
use async_trait::async_trait;
use model::core::value::Value;

/// What the upstream producer hands to the connector.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Announces a stream and its declared schema. The schema is not enforced.
    StreamStart {
        stream: String,
        schema: serde_json::Value,
        key_properties: Vec<String>,
    },

    Record { stream: String, record: Value },

    /// Upstream checkpoint, echoed once everything before it is stored.
    State(serde_json::Value),

    /// No more records will arrive for this stream.
    Finalize { stream: String },
}

#[async_trait]
pub trait RecordSource: Send {
    /// Next event, or `None` once the input is exhausted.
    async fn next_event(&mut self) -> Result<Option<SourceEvent>, ConnectorError>;
}
