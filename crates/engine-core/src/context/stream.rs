use crate::metrics::Metrics;
use std::sync::Arc;
use tracing::{Span, info_span};

/// Per-stream handle for logging and shared counters.
#[derive(Debug, Clone)]
pub struct StreamContext {
    stream: Arc<str>,
    span: Span,
    metrics: Metrics,
}

impl StreamContext {
    pub fn new(stream: impl Into<String>, metrics: Metrics) -> Self {
        let stream: Arc<str> = Arc::from(stream.into());
        let span = info_span!("stream", stream = %stream);
        Self {
            stream,
            span,
            metrics,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Span every log line of this stream is recorded in.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
