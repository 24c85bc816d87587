use engine_processing::consumer::StreamSummary;
use model::core::value::Value;
use serde::Serialize;
use tokio::sync::oneshot;

/// Outcome of a stream once it has been finalized.
#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    pub summary: StreamSummary,
    /// Sequence a reopened stream continues from.
    pub next_sequence: u64,
    /// First error the stream ran into, if any.
    pub error: Option<String>,
    /// Records received after that error.
    pub dropped: u64,
}

impl StreamReport {
    /// Report of a stream that never stored anything.
    pub fn refused(stream: &str, error: String) -> Self {
        Self {
            summary: StreamSummary {
                stream: stream.to_string(),
                failed: true,
                ..StreamSummary::default()
            },
            next_sequence: 1,
            error: Some(error),
            dropped: 0,
        }
    }
}

/// Messages for a stream actor.
#[derive(Debug)]
pub enum StreamMsg {
    /// One upstream record.
    Record(Value),

    /// Periodic age check.
    Tick,

    /// Drain everything received so far; replies once stored.
    Flush {
        reply: oneshot::Sender<Result<(), String>>,
    },

    /// Drain everything and report. No messages follow.
    Finalize { reply: oneshot::Sender<StreamReport> },
}
