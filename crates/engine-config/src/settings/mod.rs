use crate::error::ConfigError;
use format::{FormatSettings, SUPPORTED_FORMATS};
use layout::DateGrain;
use provider::{CloudProviderSettings, ProviderKind};
use retry::RetrySettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub mod format;
pub mod layout;
pub mod provider;
pub mod retry;

/// Everything the connector needs to know, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub format: FormatSettings,

    pub cloud_provider: CloudProviderSettings,

    /// Leading key segment shared by all artifacts.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "enabled")]
    pub append_date_to_prefix: bool,

    #[serde(default = "default_prefix_grain")]
    pub append_date_to_prefix_grain: DateGrain,

    /// Render date folders as `year=YYYY/month=MM/...`.
    #[serde(default)]
    pub partition_name_enabled: bool,

    #[serde(default = "enabled")]
    pub append_date_to_filename: bool,

    #[serde(default = "default_filename_grain")]
    pub append_date_to_filename_grain: DateGrain,

    #[serde(default)]
    pub use_raw_stream_name: bool,

    /// Fixed folder used instead of the stream name.
    #[serde(default)]
    pub stream_name_path_override: Option<String>,

    /// Adds a `_process_date` field to every record.
    #[serde(default)]
    pub include_process_date: bool,

    #[serde(default)]
    pub retry: RetrySettings,

    /// Interval of the age check that drains idle batches.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Capacity of each stream's mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

fn enabled() -> bool {
    true
}

fn default_prefix_grain() -> DateGrain {
    DateGrain::Day
}

fn default_filename_grain() -> DateGrain {
    DateGrain::Second
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_mailbox_capacity() -> usize {
    1_024
}

impl TargetConfig {
    /// Config with defaults everywhere, writing to an in-memory store.
    pub fn in_memory() -> Self {
        Self {
            format: FormatSettings::default(),
            cloud_provider: CloudProviderSettings::memory(),
            prefix: String::new(),
            append_date_to_prefix: true,
            append_date_to_prefix_grain: default_prefix_grain(),
            partition_name_enabled: false,
            append_date_to_filename: true,
            append_date_to_filename_grain: default_filename_grain(),
            use_raw_stream_name: false,
            stream_name_path_override: None,
            include_process_date: false,
            retry: RetrySettings::default(),
            tick_interval_ms: default_tick_interval_ms(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        info!(path = %path.display(), "Loaded target configuration");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: TargetConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the options no record can be processed without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let format_type = self.format.format_type.to_ascii_lowercase();
        if !SUPPORTED_FORMATS.contains(&format_type.as_str()) {
            return Err(ConfigError::UnknownFormat(self.format.format_type.clone()));
        }

        let mut errors = Vec::new();

        match self.cloud_provider.cloud_provider_type {
            ProviderKind::Aws => match &self.cloud_provider.aws {
                None => return Err(ConfigError::MissingProviderSettings("aws")),
                Some(aws) if aws.bucket.trim().is_empty() => {
                    errors.push("cloud_provider.aws.bucket must not be empty".to_string())
                }
                Some(_) => {}
            },
            ProviderKind::Local => match &self.cloud_provider.local {
                None => return Err(ConfigError::MissingProviderSettings("local")),
                Some(local) if local.root.trim().is_empty() => {
                    errors.push("cloud_provider.local.root must not be empty".to_string())
                }
                Some(_) => {}
            },
            ProviderKind::Memory => {}
        }

        if self.cloud_provider.timeout_secs == 0 {
            errors.push("cloud_provider.timeout_secs must be greater than 0".to_string());
        }
        if !self.format.delimiter.is_ascii() || self.format.delimiter == '\n' {
            errors.push(format!(
                "format.delimiter '{}' must be a single ASCII character other than newline",
                self.format.delimiter.escape_default()
            ));
        }
        if self.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be at least 1".to_string());
        }
        if self.tick_interval_ms == 0 {
            errors.push("tick_interval_ms must be greater than 0".to_string());
        }
        if self.mailbox_capacity == 0 {
            errors.push("mailbox_capacity must be greater than 0".to_string());
        }
        if let Some(path) = &self.stream_name_path_override
            && path.trim_matches('/').is_empty()
        {
            errors.push("stream_name_path_override must not be empty".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationFailed(errors));
        }

        let limits = &self.format.batch;
        if limits.max_records == 0 && limits.max_bytes == 0 && limits.max_age_secs == 0 {
            warn!("All batch limits are disabled, batches only drain on state messages or at end of input");
        }

        Ok(())
    }
}
