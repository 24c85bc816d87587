use super::{
    mailbox::Mailbox,
    messages::{StreamMsg, StreamReport},
};
use crate::error::ActorError;
use engine_processing::{consumer::BatchCoordinator, error::ConsumerError};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{Instrument, debug, error, trace, warn};

/// Owns one stream's [`BatchCoordinator`] and feeds it from the mailbox.
///
/// The first error is kept: records that arrive after it are dropped and
/// every flush or finalize reports it. When every [`Mailbox`] is dropped
/// without a finalize, buffered records are still stored.
pub struct StreamActor {
    coordinator: BatchCoordinator,
    error: Option<String>,
    dropped: u64,
    finalized: bool,
}

impl StreamActor {
    pub fn new(coordinator: BatchCoordinator) -> Self {
        Self {
            coordinator,
            error: None,
            dropped: 0,
            finalized: false,
        }
    }

    /// Runs the actor on its own task, in the caller's span.
    pub fn spawn(self, mailbox_capacity: usize) -> (Mailbox, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let mailbox = Mailbox::new(self.coordinator.stream(), tx);
        let task = tokio::spawn(self.run(rx).in_current_span());
        (mailbox, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<StreamMsg>) {
        let span = self.coordinator.format().context().span().clone();
        async move {
            debug!("Stream actor started");

            while let Some(msg) = rx.recv().await {
                if let Err(err) = self.dispatch(msg).await {
                    warn!(error = %err, "Reply was not delivered");
                }
            }

            if !self.finalized && self.error.is_none() && !self.coordinator.format().is_idle() {
                warn!("Mailbox closed without finalize, storing buffered records");
                if let Err(err) = self.coordinator.finalize().await {
                    self.record_error(err);
                }
            }

            let summary = self.coordinator.summary();
            debug!(
                records = summary.records,
                batches = summary.batches,
                dropped = self.dropped,
                "Stream actor stopped"
            );
        }
        .instrument(span)
        .await
    }

    fn record_error(&mut self, err: ConsumerError) {
        error!(stream = %self.coordinator.stream(), error = %err, "Stream stopped accepting records");
        if self.error.is_none() {
            self.error = Some(err.to_string());
        }
    }

    /// Stores everything buffered unless the stream already failed.
    async fn drain_all(&mut self) {
        if self.error.is_none()
            && let Err(err) = self.coordinator.finalize().await
        {
            self.record_error(err);
        }
    }

    async fn dispatch(&mut self, msg: StreamMsg) -> Result<(), ActorError> {
        match msg {
            StreamMsg::Record(value) => {
                if self.error.is_some() {
                    self.dropped += 1;
                    self.coordinator.format().context().metrics().record_dropped();
                    trace!(dropped = self.dropped, "Dropping record of failed stream");
                    return Ok(());
                }
                if let Err(err) = self.coordinator.process(value).await {
                    self.record_error(err);
                }
            }
            StreamMsg::Tick => {
                if self.error.is_some() {
                    return Ok(());
                }
                if let Err(err) = self.coordinator.tick().await {
                    self.record_error(err);
                }
            }
            StreamMsg::Flush { reply } => {
                self.drain_all().await;
                let outcome = match &self.error {
                    Some(reason) => Err(reason.clone()),
                    None => Ok(()),
                };
                reply
                    .send(outcome)
                    .map_err(|_| ActorError::NoReply(self.coordinator.stream().to_string()))?;
            }
            StreamMsg::Finalize { reply } => {
                self.drain_all().await;
                self.finalized = true;
                let report = StreamReport {
                    summary: self.coordinator.summary().clone(),
                    next_sequence: self.coordinator.format().next_sequence(),
                    error: self.error.clone(),
                    dropped: self.dropped,
                };
                reply
                    .send(report)
                    .map_err(|_| ActorError::NoReply(self.coordinator.stream().to_string()))?;
            }
        }
        Ok(())
    }
}
