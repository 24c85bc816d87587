use crate::records::record::Record;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Identity of a sealed batch: which stream, when it opened, its position.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMeta {
    pub stream: String,
    pub started_at: DateTime<Utc>,
    pub sequence: u64,
    pub record_count: usize,
}

/// The open batch of one stream. Records keep their append order.
#[derive(Debug, Clone)]
pub struct Batch {
    stream: String,
    records: Vec<Record>,
    size_bytes: usize,
    started_at: Option<DateTime<Utc>>,
}

impl Batch {
    pub fn new(stream: impl Into<String>) -> Self {
        Batch {
            stream: stream.into(),
            records: Vec::new(),
            size_bytes: 0,
            started_at: None,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Adds a record; the first record fixes the batch start time.
    pub fn push(&mut self, record: Record, now: DateTime<Utc>) {
        self.started_at.get_or_insert(now);
        self.size_bytes += record.size_bytes();
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Time since the first record; zero for an empty batch.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }

    /// Closes the batch under `sequence`, sanitizing every record.
    ///
    /// The batch is left empty and ready to accept the next records.
    pub fn seal(&mut self, sequence: u64) -> Option<SealedBatch> {
        let started_at = self.started_at.take()?;
        let records: Vec<Record> = std::mem::take(&mut self.records)
            .into_iter()
            .map(Record::sanitized)
            .collect();
        self.size_bytes = 0;

        Some(SealedBatch {
            meta: BatchMeta {
                stream: self.stream.clone(),
                started_at,
                sequence,
                record_count: records.len(),
            },
            records,
        })
    }
}

/// A closed, sanitized batch. Its content never changes after sealing.
#[derive(Debug, Clone)]
pub struct SealedBatch {
    meta: BatchMeta,
    records: Vec<Record>,
}

impl SealedBatch {
    pub fn meta(&self) -> &BatchMeta {
        &self.meta
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(v: serde_json::Value) -> Record {
        Record::try_from(v).unwrap()
    }

    #[test]
    fn test_push_tracks_start_and_size() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut batch = Batch::new("users");
        assert_eq!(batch.age(t0), Duration::ZERO);

        batch.push(record(json!({"id": 1})), t0);
        batch.push(record(json!({"id": 2})), t0 + chrono::Duration::seconds(30));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.started_at(), Some(t0));
        assert!(batch.size_bytes() > 0);
        assert_eq!(
            batch.age(t0 + chrono::Duration::seconds(90)),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_seal_sanitizes_and_resets() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut batch = Batch::new("users");
        let mut dirty = Record::default();
        dirty.insert("name", Value::Utf16(vec![0x41, 0xDFFF]));
        batch.push(record(json!({"id": 1})), t0);
        batch.push(dirty, t0);

        let sealed = batch.seal(7).unwrap();
        assert_eq!(sealed.meta().sequence, 7);
        assert_eq!(sealed.meta().record_count, 2);
        assert_eq!(sealed.meta().started_at, t0);
        assert_eq!(sealed.records()[1].get("name"), Some(&Value::from("A")));

        assert!(batch.is_empty());
        assert_eq!(batch.size_bytes(), 0);
        assert_eq!(batch.started_at(), None);
        assert!(batch.seal(8).is_none());
    }
}
