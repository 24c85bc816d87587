use crate::error::RuntimeError;
use connectors::{
    format::{key::KeyLayout, registry::FormatRegistry},
    storage::{StorageSink, object::ObjectStorageSink},
};
use engine_config::settings::TargetConfig;
use engine_core::{
    context::stream::StreamContext,
    format::{Format, FormatTarget},
    metrics::Metrics,
    retry::RetryPolicy,
};
use engine_processing::consumer::BatchCoordinator;
use std::sync::Arc;
use tracing::info;

pub fn create_sink(config: &TargetConfig) -> Result<Arc<dyn StorageSink>, RuntimeError> {
    let sink = ObjectStorageSink::from_settings(&config.cloud_provider)?;
    info!(sink = %sink.describe(), "Storage sink ready");
    Ok(Arc::new(sink))
}

/// Resolves the writer and key layout every stream shares.
pub fn build_target(
    config: &TargetConfig,
    sink: Arc<dyn StorageSink>,
) -> Result<FormatTarget, RuntimeError> {
    let writer = FormatRegistry::default().create(&config.format)?;
    Ok(FormatTarget {
        writer,
        sink,
        layout: Arc::new(KeyLayout::from_config(config)),
        include_process_date: config.include_process_date,
    })
}

pub fn create_coordinator(
    stream: &str,
    target: FormatTarget,
    config: &TargetConfig,
    metrics: Metrics,
    first_sequence: u64,
) -> BatchCoordinator {
    let format =
        Format::new(StreamContext::new(stream, metrics), target).starting_at(first_sequence);
    BatchCoordinator::new(
        format,
        config.format.batch,
        RetryPolicy::from_settings(&config.retry),
    )
}
