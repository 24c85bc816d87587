use engine_config::settings::{TargetConfig, layout::DateGrain};
use model::{core::identifiers::StorageKey, records::batch::BatchMeta};

/// Deterministic storage keys for sealed batches.
///
/// `prefix/[date folder/]stream/[date-]sequence.extension`. Every date is
/// taken from the batch start time, so the same batch always maps to the
/// same key.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    prefix: String,
    prefix_date: Option<DateGrain>,
    partition_names: bool,
    filename_date: Option<DateGrain>,
    use_raw_stream_name: bool,
    stream_override: Option<String>,
}

impl KeyLayout {
    pub fn from_config(config: &TargetConfig) -> Self {
        Self {
            prefix: config.prefix.trim_matches('/').to_string(),
            prefix_date: config
                .append_date_to_prefix
                .then_some(config.append_date_to_prefix_grain),
            partition_names: config.partition_name_enabled,
            filename_date: config
                .append_date_to_filename
                .then_some(config.append_date_to_filename_grain),
            use_raw_stream_name: config.use_raw_stream_name,
            stream_override: config
                .stream_name_path_override
                .as_ref()
                .map(|p| p.trim_matches('/').to_string()),
        }
    }

    /// Folder a stream's artifacts are written under.
    pub fn stream_identifier(&self, stream: &str) -> String {
        if let Some(path) = &self.stream_override {
            return path.clone();
        }
        if self.use_raw_stream_name {
            return stream.to_string();
        }
        stream_folder(stream)
    }

    pub fn key_for(&self, meta: &BatchMeta, extension: &str) -> StorageKey {
        let mut segments = Vec::with_capacity(4);
        if !self.prefix.is_empty() {
            segments.push(self.prefix.clone());
        }
        if let Some(grain) = self.prefix_date {
            segments.push(grain.folder(meta.started_at, self.partition_names));
        }
        segments.push(self.stream_identifier(&meta.stream));

        let stamp = self
            .filename_date
            .map(|grain| format!("{}-", grain.stamp(meta.started_at)))
            .unwrap_or_default();
        segments.push(format!("{stamp}{:06}.{extension}", meta.sequence));

        StorageKey::new(segments.join("/"))
    }
}

/// Folder name derived from a stream name.
///
/// Upstream names look like `schema-table`; the part after the first `-` is
/// kept, and anything outside `[A-Za-z0-9_.]` becomes `_`.
pub fn stream_folder(stream: &str) -> String {
    let name = match stream.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => stream,
    };
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
