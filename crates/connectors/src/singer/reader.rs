use super::message::SingerMessage;
use crate::{
    error::ConnectorError,
    source::{RecordSource, SourceEvent},
};
use async_trait::async_trait;
use model::core::sanitize::strip_surrogate_escapes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, trace};

/// Reads Singer messages, one JSON document per line.
///
/// Escaped lone surrogates are dropped before decoding; blank lines are
/// skipped.
pub struct SingerReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R> SingerReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn parse(&self, raw: &str) -> Result<SingerMessage, ConnectorError> {
        let cleaned = strip_surrogate_escapes(raw);
        serde_json::from_str(&cleaned).map_err(|e| ConnectorError::InvalidMessage {
            line: self.line,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl<R> RecordSource for SingerReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_event(&mut self) -> Result<Option<SourceEvent>, ConnectorError> {
        while let Some(raw) = self.lines.next_line().await? {
            self.line += 1;
            if raw.trim().is_empty() {
                continue;
            }

            let message = self.parse(&raw)?;
            match message.into_event() {
                Some(event) => return Ok(Some(event)),
                None => trace!(line = self.line, "Ignoring ACTIVATE_VERSION message"),
            }
        }

        debug!(lines = self.line, "Input exhausted");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    #[tokio::test]
    async fn test_reads_events_and_skips_noise() {
        let input = concat!(
            "{\"type\":\"SCHEMA\",\"stream\":\"s\",\"schema\":{}}\n",
            "\n",
            "{\"type\":\"ACTIVATE_VERSION\",\"stream\":\"s\",\"version\":1}\n",
            "{\"type\":\"RECORD\",\"stream\":\"s\",\"record\":{\"v\":\"Hello\\ud800World\"}}\n",
            "{\"type\":\"STATE\",\"value\":{\"bookmark\":1}}\n",
        );
        let mut reader = SingerReader::new(input.as_bytes());

        assert!(matches!(
            reader.next_event().await.unwrap(),
            Some(SourceEvent::StreamStart { .. })
        ));
        match reader.next_event().await.unwrap() {
            Some(SourceEvent::Record { record, .. }) => {
                assert_eq!(record.as_map().unwrap()["v"], Value::from("HelloWorld"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            reader.next_event().await.unwrap(),
            Some(SourceEvent::State(serde_json::json!({"bookmark": 1})))
        );
        assert_eq!(reader.next_event().await.unwrap(), None);
        assert_eq!(reader.lines_read(), 5);
    }

    #[tokio::test]
    async fn test_invalid_line_reports_position() {
        let mut reader = SingerReader::new("\nnot json\n".as_bytes());
        match reader.next_event().await {
            Err(ConnectorError::InvalidMessage { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
