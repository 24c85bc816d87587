use crate::{context::stream::StreamContext, error::BatchError};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use connectors::{
    format::{FormatWriter, key::KeyLayout},
    storage::StorageSink,
};
use model::{
    core::{identifiers::StorageKey, value::Value},
    records::{
        batch::{Batch, BatchMeta, SealedBatch},
        record::Record,
    },
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// Field added to every record when process dates are enabled.
pub const PROCESS_DATE_FIELD: &str = "_process_date";

/// Shared, read-only pieces every stream's [`Format`] writes through.
#[derive(Clone)]
pub struct FormatTarget {
    pub writer: Arc<dyn FormatWriter>,
    pub sink: Arc<dyn StorageSink>,
    pub layout: Arc<KeyLayout>,
    pub include_process_date: bool,
}

/// Result of one successful drain.
#[derive(Debug, Clone)]
pub struct Drained {
    pub meta: BatchMeta,
    pub key: StorageKey,
    pub bytes: usize,
}

/// A sealed batch that was serialized but not stored yet.
#[derive(Debug, Clone)]
struct PendingDrain {
    meta: BatchMeta,
    key: StorageKey,
    body: Bytes,
}

/// Buffers one stream's records and turns them into stored artifacts.
///
/// The stream owns exactly one open batch. A drain seals it, serializes it
/// and stores it under a key derived from the batch. When storing fails the
/// sealed bytes and key are kept: the next drain retries them unchanged and
/// no new records are accepted until it succeeds. A sealed batch the writer
/// cannot serialize is kept as rejected and closes the stream.
pub struct Format {
    ctx: StreamContext,
    target: FormatTarget,
    batch: Batch,
    next_sequence: u64,
    pending: Option<PendingDrain>,
    rejected: Option<SealedBatch>,
}

impl Format {
    pub fn new(ctx: StreamContext, target: FormatTarget) -> Self {
        let batch = Batch::new(ctx.stream());
        Self {
            ctx,
            target,
            batch,
            next_sequence: 1,
            pending: None,
            rejected: None,
        }
    }

    /// Continues a stream that was finalized earlier in the same run.
    pub fn starting_at(mut self, sequence: u64) -> Self {
        self.next_sequence = sequence.max(1);
        self
    }

    pub fn stream(&self) -> &str {
        self.ctx.stream()
    }

    pub fn context(&self) -> &StreamContext {
        &self.ctx
    }

    /// Sequence number the next sealed batch gets.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_key(&self) -> Option<&StorageKey> {
        self.pending.as_ref().map(|p| &p.key)
    }

    /// Sealed records the writer refused, kept as they were sealed.
    pub fn rejected(&self) -> Option<&SealedBatch> {
        self.rejected.as_ref()
    }

    pub fn buffered_records(&self) -> usize {
        self.batch.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.batch.size_bytes()
    }

    pub fn batch_age(&self, now: DateTime<Utc>) -> Duration {
        self.batch.age(now)
    }

    /// True when there is nothing to store: no open records, no pending drain.
    pub fn is_idle(&self) -> bool {
        self.batch.is_empty() && self.pending.is_none() && self.rejected.is_none()
    }

    pub fn append(&mut self, mut record: Record, now: DateTime<Utc>) -> Result<(), BatchError> {
        self.ensure_not_rejected()?;
        if self.pending.is_some() {
            return Err(BatchError::DrainPending {
                stream: self.stream().to_string(),
            });
        }

        if self.target.include_process_date {
            record.insert(
                PROCESS_DATE_FIELD,
                Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        self.batch.push(record, now);
        self.ctx.metrics().record_appended();
        Ok(())
    }

    /// Stores the open batch, or retries the pending one.
    ///
    /// Returns `Ok(None)` when there was nothing to store.
    pub async fn drain(&mut self) -> Result<Option<Drained>, BatchError> {
        self.ensure_not_rejected()?;
        if self.pending.is_none() && !self.seal()? {
            return Ok(None);
        }
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };

        if let Err(err) = self
            .target
            .sink
            .persist(&pending.key, pending.body.clone())
            .await
        {
            warn!(
                parent: self.ctx.span(),
                key = %pending.key,
                sequence = pending.meta.sequence,
                error = %err,
                "Failed to store batch, keeping it for retry"
            );
            return Err(err.into());
        }

        let Some(stored) = self.pending.take() else {
            return Ok(None);
        };
        self.next_sequence = stored.meta.sequence + 1;

        self.ctx.metrics().batch_stored(stored.body.len());

        info!(
            parent: self.ctx.span(),
            key = %stored.key,
            records = stored.meta.record_count,
            bytes = stored.body.len(),
            "Batch stored"
        );

        Ok(Some(Drained {
            meta: stored.meta,
            key: stored.key,
            bytes: stored.body.len(),
        }))
    }

    fn ensure_not_rejected(&self) -> Result<(), BatchError> {
        match &self.rejected {
            Some(rejected) => Err(BatchError::Rejected {
                stream: self.stream().to_string(),
                sequence: rejected.meta().sequence,
            }),
            None => Ok(()),
        }
    }

    /// Seals and serializes the open batch into the pending slot.
    fn seal(&mut self) -> Result<bool, BatchError> {
        let sequence = self.next_sequence;
        let Some(sealed) = self.batch.seal(sequence) else {
            return Ok(false);
        };

        let body = match self.target.writer.write_batch(sealed.records()) {
            Ok(body) => body,
            Err(source) => {
                error!(
                    parent: self.ctx.span(),
                    sequence,
                    records = sealed.meta().record_count,
                    error = %source,
                    "Batch cannot be serialized, keeping its records"
                );
                self.rejected = Some(sealed);
                return Err(BatchError::Format {
                    stream: self.stream().to_string(),
                    sequence,
                    source,
                });
            }
        };
        let key = self
            .target
            .layout
            .key_for(sealed.meta(), self.target.writer.extension());

        debug!(
            parent: self.ctx.span(),
            key = %key,
            records = sealed.meta().record_count,
            "Batch sealed"
        );

        self.pending = Some(PendingDrain {
            meta: sealed.meta().clone(),
            key,
            body: Bytes::from(body),
        });
        Ok(true)
    }
}
