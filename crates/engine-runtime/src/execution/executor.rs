use crate::{
    actor::{Mailbox, StreamActor, messages::StreamReport},
    error::{ActorError, RuntimeError},
    execution::factory,
};
use connectors::{
    source::{RecordSource, SourceEvent},
    storage::StorageSink,
};
use engine_config::settings::TargetConfig;
use engine_core::{
    format::FormatTarget,
    metrics::{Metrics, MetricsSnapshot},
};
use futures::future::join_all;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub streams: Vec<StreamReport>,
    pub metrics: MetricsSnapshot,
}

impl RunSummary {
    pub fn failed_streams(&self) -> Vec<String> {
        self.streams
            .iter()
            .filter(|report| report.error.is_some())
            .map(|report| report.summary.stream.clone())
            .collect()
    }

    pub fn stream(&self, name: &str) -> Option<&StreamReport> {
        self.streams.iter().find(|r| r.summary.stream == name)
    }
}

/// Reads `source` to the end and stores every record through `sink`.
///
/// State messages are written to `state_out` once everything received before
/// them is stored. Fails when any stream failed, after all other streams
/// were finalized.
pub async fn run<S, W>(
    config: Arc<TargetConfig>,
    sink: Arc<dyn StorageSink>,
    source: S,
    state_out: W,
    cancel: CancellationToken,
) -> Result<RunSummary, RuntimeError>
where
    S: RecordSource,
    W: AsyncWrite + Unpin + Send,
{
    let summary = SinkExecutor::new(config, sink, state_out)?
        .execute(source, cancel)
        .await?;

    let failed = summary.failed_streams();
    if !failed.is_empty() {
        return Err(RuntimeError::StreamsFailed { streams: failed });
    }
    Ok(summary)
}

struct StreamHandle {
    mailbox: Mailbox,
    task: JoinHandle<()>,
}

struct SinkExecutor<W> {
    config: Arc<TargetConfig>,
    target: FormatTarget,
    metrics: Metrics,
    streams: HashMap<String, StreamHandle>,
    /// Next sequence of streams finalized earlier in the run.
    resume: HashMap<String, u64>,
    /// Stream that owns each stream identifier.
    owners: HashMap<String, String>,
    /// Streams whose later records are dropped.
    refused: HashSet<String>,
    finished: Vec<StreamReport>,
    state_out: W,
}

impl<W> SinkExecutor<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn new(
        config: Arc<TargetConfig>,
        sink: Arc<dyn StorageSink>,
        state_out: W,
    ) -> Result<Self, RuntimeError> {
        let target = factory::build_target(&config, sink)?;
        Ok(Self {
            config,
            target,
            metrics: Metrics::new(),
            streams: HashMap::new(),
            resume: HashMap::new(),
            owners: HashMap::new(),
            refused: HashSet::new(),
            finished: Vec::new(),
            state_out,
        })
    }

    async fn execute<S: RecordSource>(
        mut self,
        mut source: S,
        cancel: CancellationToken,
    ) -> Result<RunSummary, RuntimeError> {
        info!(format = %self.target.writer.name(), "Sink run started");

        let mut ticker = tokio::time::interval(Duration::from_millis(
            self.config.tick_interval_ms.max(1),
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!("Shutdown requested, finalizing open batches");
                    break Ok(());
                }

                event = source.next_event() => match event {
                    Ok(Some(event)) => {
                        if let Err(err) = self.on_event(event).await {
                            break Err(err);
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(RuntimeError::from(err)),
                },

                _ = ticker.tick() => self.tick(),
            }
        };

        // open batches are stored even when the input broke off
        self.finalize_all().await;
        outcome?;

        let metrics = self.metrics.snapshot();
        info!(
            streams = self.finished.len(),
            records = metrics.records_appended,
            dropped = metrics.records_dropped,
            batches = metrics.batches_stored,
            bytes = metrics.bytes_stored,
            mean_batch_bytes = metrics.mean_batch_bytes(),
            retries = metrics.retries,
            failures = metrics.failures,
            states = metrics.states_emitted,
            "Sink run finished"
        );

        Ok(RunSummary {
            streams: self.finished,
            metrics,
        })
    }

    async fn on_event(&mut self, event: SourceEvent) -> Result<(), RuntimeError> {
        match event {
            SourceEvent::StreamStart {
                stream,
                key_properties,
                ..
            } => {
                debug!(stream = %stream, ?key_properties, "Stream announced");
                self.stream(&stream);
            }
            SourceEvent::Record { stream, record } => match self.stream(&stream) {
                Some(mailbox) => mailbox.record(record).await?,
                None => self.drop_record(&stream),
            },
            SourceEvent::State(value) => self.checkpoint(value).await?,
            SourceEvent::Finalize { stream } => {
                if let Some(handle) = self.streams.remove(&stream) {
                    let report = finalize_stream(&stream, handle).await;
                    if report.error.is_some() {
                        // the failed batch still owns its key
                        warn!(stream = %stream, "Stream failed, later records are dropped");
                        self.refused.insert(stream.clone());
                    } else {
                        self.resume.insert(stream, report.next_sequence);
                    }
                    self.finished.push(report);
                }
            }
        }
        Ok(())
    }

    /// Actor of `stream`, spawned on first use.
    ///
    /// `None` for a stream that failed earlier in the run, or whose stream
    /// identifier another stream already writes under.
    fn stream(&mut self, stream: &str) -> Option<&Mailbox> {
        if self.refused.contains(stream) {
            return None;
        }
        if !self.streams.contains_key(stream) {
            self.claim_identifier(stream).ok()?;
            let coordinator = factory::create_coordinator(
                stream,
                self.target.clone(),
                &self.config,
                self.metrics.clone(),
                self.resume.get(stream).copied().unwrap_or(1),
            );
            let (mailbox, task) =
                StreamActor::new(coordinator).spawn(self.config.mailbox_capacity);
            info!(stream = %stream, "Stream opened");
            self.streams
                .insert(stream.to_string(), StreamHandle { mailbox, task });
        }
        self.streams.get(stream).map(|handle| &handle.mailbox)
    }

    /// Reserves the folder `stream` writes under, refusing the stream when
    /// another stream already owns it.
    fn claim_identifier(&mut self, stream: &str) -> Result<(), RuntimeError> {
        let identifier = self.target.layout.stream_identifier(stream);
        match self.owners.get(&identifier) {
            Some(owner) if owner != stream => {
                let err = RuntimeError::IdentifierTaken {
                    stream: stream.to_string(),
                    identifier,
                    owner: owner.clone(),
                };
                error!(stream = %stream, error = %err, "Stream refused");
                self.refused.insert(stream.to_string());
                self.finished.push(StreamReport::refused(stream, err.to_string()));
                Err(err)
            }
            Some(_) => Ok(()),
            None => {
                self.owners.insert(identifier, stream.to_string());
                Ok(())
            }
        }
    }

    fn drop_record(&mut self, stream: &str) {
        if let Some(report) = self
            .finished
            .iter_mut()
            .rev()
            .find(|report| report.summary.stream == stream)
        {
            report.dropped += 1;
            self.metrics.record_dropped();
            trace!(stream = %stream, dropped = report.dropped, "Dropping record of refused stream");
        }
    }

    fn tick(&self) {
        for (stream, handle) in &self.streams {
            // a busy mailbox already makes progress
            match handle.mailbox.tick() {
                Ok(true) => {}
                Ok(false) => debug!(stream = %stream, "Skipping tick, mailbox full"),
                Err(err) => debug!(stream = %stream, error = %err, "Skipping tick"),
            }
        }
    }

    /// Drains every stream, then echoes `value` as one JSON line.
    async fn checkpoint(&mut self, value: serde_json::Value) -> Result<(), RuntimeError> {
        let mut pending = Vec::with_capacity(self.streams.len());
        for (stream, handle) in &self.streams {
            let rx = handle.mailbox.flush().await?;
            pending.push(async move { (stream.clone(), rx.await) });
        }

        let mut blocked: Vec<(String, String)> = self
            .refused
            .iter()
            .map(|stream| (stream.clone(), "stream failed earlier in the run".to_string()))
            .collect();
        for (stream, outcome) in join_all(pending).await {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => blocked.push((stream, reason)),
                Err(_) => blocked.push((stream.clone(), ActorError::NoReply(stream).to_string())),
            }
        }
        if !blocked.is_empty() {
            for (stream, reason) in &blocked {
                warn!(stream = %stream, reason = %reason, "Withholding state, stream not drained");
            }
            return Ok(());
        }

        let mut line = serde_json::to_vec(&value)?;
        line.push(b'\n');
        self.state_out.write_all(&line).await?;
        self.state_out.flush().await?;
        self.metrics.state_emitted();
        debug!("State emitted");
        Ok(())
    }

    async fn finalize_all(&mut self) {
        let streams: Vec<(String, StreamHandle)> = self.streams.drain().collect();
        let reports = join_all(
            streams
                .into_iter()
                .map(|(stream, handle)| async move { finalize_stream(&stream, handle).await }),
        )
        .await;
        self.finished.extend(reports);
        self.finished
            .sort_by(|a, b| a.summary.stream.cmp(&b.summary.stream));
    }
}

async fn finalize_stream(stream: &str, handle: StreamHandle) -> StreamReport {
    let report = handle.mailbox.finalize().await;
    drop(handle.mailbox);

    if let Err(err) = handle.task.await {
        warn!(stream = %stream, error = %err, "Stream task ended abnormally");
    }

    report.unwrap_or_else(|err| StreamReport::refused(stream, err.to_string()))
}
