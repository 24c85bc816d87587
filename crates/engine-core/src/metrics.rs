use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct Counters {
    records_appended: AtomicU64,
    records_dropped: AtomicU64,
    batches_stored: AtomicU64,
    bytes_stored: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
    states_emitted: AtomicU64,
}

/// Counters shared by every stream of a run.
///
/// Batches and bytes count once per stored artifact, however many attempts
/// it took; the attempts themselves show up as retries.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_appended: u64,
    /// Records of failed or refused streams that were never buffered.
    pub records_dropped: u64,
    pub batches_stored: u64,
    pub bytes_stored: u64,
    pub retries: u64,
    pub failures: u64,
    pub states_emitted: u64,
}

impl MetricsSnapshot {
    /// Mean size of a stored artifact, 0 before the first one.
    pub fn mean_batch_bytes(&self) -> u64 {
        self.bytes_stored
            .checked_div(self.batches_stored)
            .unwrap_or_default()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_appended(&self) {
        bump(&self.inner.records_appended, 1);
    }

    pub fn record_dropped(&self) {
        bump(&self.inner.records_dropped, 1);
    }

    pub fn batch_stored(&self, bytes: usize) {
        bump(&self.inner.batches_stored, 1);
        bump(&self.inner.bytes_stored, bytes as u64);
    }

    pub fn retry_scheduled(&self) {
        bump(&self.inner.retries, 1);
    }

    pub fn stream_failed(&self) {
        bump(&self.inner.failures, 1);
    }

    pub fn state_emitted(&self) {
        bump(&self.inner.states_emitted, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            records_appended: c.records_appended.load(Ordering::Relaxed),
            records_dropped: c.records_dropped.load(Ordering::Relaxed),
            batches_stored: c.batches_stored.load(Ordering::Relaxed),
            bytes_stored: c.bytes_stored.load(Ordering::Relaxed),
            retries: c.retries.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            states_emitted: c.states_emitted.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64, count: u64) {
    counter.fetch_add(count, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let stream = metrics.clone();

        stream.record_appended();
        stream.record_appended();
        stream.batch_stored(100);
        metrics.batch_stored(50);
        metrics.retry_scheduled();
        metrics.state_emitted();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_appended, 2);
        assert_eq!(snapshot.batches_stored, 2);
        assert_eq!(snapshot.bytes_stored, 150);
        assert_eq!(snapshot.mean_batch_bytes(), 75);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.states_emitted, 1);
        assert_eq!(snapshot.records_dropped, 0);
    }

    #[test]
    fn test_mean_without_batches() {
        assert_eq!(MetricsSnapshot::default().mean_batch_bytes(), 0);
    }
}
