#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use connectors::{
    singer::SingerReader,
    storage::{StorageError, StorageSink, object::ObjectStorageSink},
};
use engine_config::settings::TargetConfig;
use engine_runtime::{
    error::RuntimeError,
    execution::executor::{RunSummary, run},
};
use futures::TryStreamExt;
use model::core::identifiers::StorageKey;
use object_store::{ObjectStore, path::Path};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Config writing `format_type` artifacts without any date segments.
pub fn config(format_type: &str) -> TargetConfig {
    let mut config = TargetConfig::in_memory();
    config.format.format_type = format_type.to_string();
    config.append_date_to_prefix = false;
    config.append_date_to_filename = false;
    config.format.batch.max_age_secs = 0;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

pub fn schema(stream: &str) -> Value {
    json!({"type": "SCHEMA", "stream": stream, "schema": {"type": "object"}, "key_properties": []})
}

pub fn record(stream: &str, record: Value) -> Value {
    json!({"type": "RECORD", "stream": stream, "record": record})
}

pub fn state(value: Value) -> Value {
    json!({"type": "STATE", "value": value})
}

/// One message per line, as a tap writes them.
pub fn singer_input(messages: &[Value]) -> String {
    messages
        .iter()
        .map(|m| format!("{m}\n"))
        .collect::<String>()
}

pub struct RunOutput {
    pub result: Result<RunSummary, RuntimeError>,
    pub state_lines: Vec<String>,
}

/// Runs `input` through the executor; state messages are captured.
pub async fn run_singer(
    config: TargetConfig,
    sink: Arc<dyn StorageSink>,
    input: &str,
) -> RunOutput {
    let mut out = Vec::new();
    let result = run(
        Arc::new(config),
        sink,
        SingerReader::new(input.as_bytes()),
        &mut out,
        CancellationToken::new(),
    )
    .await;

    let state_lines = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    RunOutput {
        result,
        state_lines,
    }
}

/// All keys in `store`, sorted.
pub async fn list_keys(store: &Arc<dyn ObjectStore>) -> Vec<String> {
    let objects: Vec<_> = store.list(None).try_collect().await.unwrap();
    let mut keys: Vec<String> = objects.into_iter().map(|m| m.location.to_string()).collect();
    keys.sort();
    keys
}

pub async fn read_object(store: &Arc<dyn ObjectStore>, key: &str) -> Bytes {
    let path = Path::parse(key).unwrap();
    store.get(&path).await.unwrap().bytes().await.unwrap()
}

pub async fn read_text(store: &Arc<dyn ObjectStore>, key: &str) -> String {
    String::from_utf8(read_object(store, key).await.to_vec()).unwrap()
}

/// How [`FlakySink`] answers the next attempts.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Transient,
    Permanent,
}

/// Fails scripted attempts, then delegates to an in-memory object store.
pub struct FlakySink {
    inner: ObjectStorageSink,
    faults: Mutex<Vec<Fault>>,
    attempts: Mutex<Vec<(String, Bytes)>>,
}

impl FlakySink {
    pub fn new(faults: Vec<Fault>) -> Arc<Self> {
        Arc::new(Self {
            inner: ObjectStorageSink::in_memory(),
            faults: Mutex::new(faults.into_iter().rev().collect()),
            attempts: Mutex::default(),
        })
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.inner.store()
    }

    pub fn attempts(&self) -> Vec<(String, Bytes)> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageSink for FlakySink {
    async fn persist(&self, key: &StorageKey, body: Bytes) -> Result<(), StorageError> {
        self.attempts
            .lock()
            .unwrap()
            .push((key.to_string(), body.clone()));

        let fault = self.faults.lock().unwrap().pop();
        match fault {
            Some(Fault::Transient) => Err(StorageError::transient(key, "503 Slow Down")),
            Some(Fault::Permanent) => Err(StorageError::permanent(key, "403 Access Denied")),
            None => self.inner.persist(key, body).await,
        }
    }

    fn describe(&self) -> String {
        format!("flaky {}", self.inner.describe())
    }
}
