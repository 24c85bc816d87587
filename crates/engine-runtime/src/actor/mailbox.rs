use super::messages::{StreamMsg, StreamReport};
use crate::error::ActorError;
use model::core::value::Value;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

/// Sending side of one stream actor's mailbox.
///
/// Records wait for capacity, so a source cannot run ahead of storage by
/// more than one mailbox. Ticks never wait.
#[derive(Debug, Clone)]
pub struct Mailbox {
    stream: Arc<str>,
    tx: mpsc::Sender<StreamMsg>,
}

impl Mailbox {
    pub(crate) fn new(stream: &str, tx: mpsc::Sender<StreamMsg>) -> Self {
        Self {
            stream: Arc::from(stream),
            tx,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub async fn record(&self, value: Value) -> Result<(), ActorError> {
        self.send(StreamMsg::Record(value)).await
    }

    /// Queues an age check. `Ok(false)` when the mailbox is full.
    pub fn tick(&self) -> Result<bool, ActorError> {
        match self.tx.try_send(StreamMsg::Tick) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Closed(_)) => Err(self.closed()),
        }
    }

    /// Asks for everything received so far to be stored.
    ///
    /// The returned receiver resolves once that happened, or with the
    /// stream's error.
    pub async fn flush(&self) -> Result<oneshot::Receiver<Result<(), String>>, ActorError> {
        let (reply, rx) = oneshot::channel();
        self.send(StreamMsg::Flush { reply }).await?;
        Ok(rx)
    }

    /// Stores the open batch and collects the stream's report.
    pub async fn finalize(&self) -> Result<StreamReport, ActorError> {
        let (reply, rx) = oneshot::channel();
        self.send(StreamMsg::Finalize { reply }).await?;
        rx.await
            .map_err(|_| ActorError::NoReply(self.stream.to_string()))
    }

    async fn send(&self, msg: StreamMsg) -> Result<(), ActorError> {
        self.tx.send(msg).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> ActorError {
        ActorError::MailboxClosed(self.stream.to_string())
    }
}
