use crate::{
    consumer::trigger::{self, DrainTrigger},
    error::ConsumerError,
    retry::classify_batch_error,
};
use chrono::{DateTime, Utc};
use engine_config::settings::format::BatchLimits;
use engine_core::{
    error::BatchError,
    format::{Drained, Format},
    retry::{RetryDisposition, RetryPolicy},
};
use model::{
    core::{identifiers::StorageKey, value::Value},
    records::record::Record,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No records buffered.
    Empty,
    /// Records buffered, no limit reached yet.
    Accumulating,
    /// A drain is in progress, retries included.
    Draining,
    /// A batch could not be stored. Terminal.
    Failed,
}

/// What one stream produced during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub stream: String,
    pub records: u64,
    pub batches: u64,
    pub first_key: Option<StorageKey>,
    pub last_key: Option<StorageKey>,
    pub failed: bool,
}

/// Decides when a stream's batch is drained and what happens when storing it fails.
///
/// Records are appended until the first configured limit is reached; the
/// batch is then drained. Transient storage failures are retried against the
/// same key and bytes with bounded backoff. A permanent failure, or running
/// out of attempts, moves the coordinator to [`CoordinatorState::Failed`]
/// and every later call is refused.
pub struct BatchCoordinator {
    format: Format,
    limits: BatchLimits,
    retry: RetryPolicy,
    state: CoordinatorState,
    summary: StreamSummary,
}

impl BatchCoordinator {
    pub fn new(format: Format, limits: BatchLimits, retry: RetryPolicy) -> Self {
        let summary = StreamSummary {
            stream: format.stream().to_string(),
            ..StreamSummary::default()
        };
        Self {
            format,
            limits,
            retry,
            state: CoordinatorState::Empty,
            summary,
        }
    }

    pub fn stream(&self) -> &str {
        self.format.stream()
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Accepts one upstream value; drains when a limit is reached.
    pub async fn process(&mut self, value: Value) -> Result<Option<Drained>, ConsumerError> {
        self.process_at(value, Utc::now()).await
    }

    pub async fn process_at(
        &mut self,
        value: Value,
        now: DateTime<Utc>,
    ) -> Result<Option<Drained>, ConsumerError> {
        self.ensure_active()?;

        let record = Record::try_from(value).map_err(|source| ConsumerError::Validation {
            stream: self.stream().to_string(),
            source,
        })?;
        self.format.append(record, now)?;
        self.summary.records += 1;
        self.state = CoordinatorState::Accumulating;

        match trigger::evaluate(
            &self.limits,
            self.format.buffered_records(),
            self.format.buffered_bytes(),
            self.format.batch_age(now),
        ) {
            Some(reason) => self.drain(reason).await,
            None => Ok(None),
        }
    }

    /// Periodic age check, drains a batch that has been open too long.
    pub async fn tick(&mut self) -> Result<Option<Drained>, ConsumerError> {
        self.tick_at(Utc::now()).await
    }

    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<Option<Drained>, ConsumerError> {
        if self.state != CoordinatorState::Accumulating {
            return Ok(None);
        }

        let age_only = BatchLimits {
            max_records: 0,
            max_bytes: 0,
            ..self.limits
        };
        match trigger::evaluate(
            &age_only,
            self.format.buffered_records(),
            self.format.buffered_bytes(),
            self.format.batch_age(now),
        ) {
            Some(reason) => self.drain(reason).await,
            None => Ok(None),
        }
    }

    /// Drains whatever is buffered, regardless of limits.
    pub async fn finalize(&mut self) -> Result<Option<Drained>, ConsumerError> {
        self.ensure_active()?;
        if self.format.is_idle() {
            return Ok(None);
        }
        self.drain(DrainTrigger::Finalize).await
    }

    fn ensure_active(&self) -> Result<(), ConsumerError> {
        if self.state == CoordinatorState::Failed {
            return Err(ConsumerError::StreamFailed {
                stream: self.stream().to_string(),
            });
        }
        Ok(())
    }

    async fn drain(&mut self, reason: DrainTrigger) -> Result<Option<Drained>, ConsumerError> {
        self.state = CoordinatorState::Draining;
        debug!(
            stream = %self.stream(),
            reason = %reason,
            records = self.format.buffered_records(),
            "Draining batch"
        );

        let mut attempt = 1;
        loop {
            match self.format.drain().await {
                Ok(drained) => {
                    self.state = CoordinatorState::Empty;
                    if let Some(drained) = &drained {
                        self.summary.batches += 1;
                        self.summary
                            .first_key
                            .get_or_insert_with(|| drained.key.clone());
                        self.summary.last_key = Some(drained.key.clone());
                        info!(
                            stream = %self.stream(),
                            key = %drained.key,
                            reason = %reason,
                            attempts = attempt,
                            "Batch drained"
                        );
                    }
                    return Ok(drained);
                }
                Err(err) => {
                    let delay = match classify_batch_error(&err) {
                        RetryDisposition::Retry => self.retry.delay_after(attempt),
                        RetryDisposition::Stop => None,
                    };
                    let Some(delay) = delay else {
                        return Err(self.fail(err, attempt));
                    };

                    self.format.context().metrics().retry_scheduled();
                    warn!(
                        stream = %self.stream(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient storage failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn fail(&mut self, err: BatchError, attempts: usize) -> ConsumerError {
        self.state = CoordinatorState::Failed;
        self.summary.failed = true;
        self.format.context().metrics().stream_failed();

        let stream = self.stream().to_string();
        let key = self
            .format
            .pending_key()
            .map(ToString::to_string)
            .unwrap_or_default();
        error!(stream = %stream, key = %key, attempts, error = %err, "Stream failed");

        match err {
            BatchError::Storage(source) if source.is_transient() => {
                ConsumerError::RetriesExhausted {
                    stream,
                    key,
                    attempts,
                    source,
                }
            }
            BatchError::Storage(source) => ConsumerError::Persist {
                stream,
                key,
                source,
            },
            other => ConsumerError::Batch(other),
        }
    }
}
