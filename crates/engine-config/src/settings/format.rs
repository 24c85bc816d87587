use serde::{Deserialize, Serialize};

/// Names accepted for `format.format_type`, aliases included.
pub const SUPPORTED_FORMATS: [&str; 6] = ["jsonl", "json", "parquet", "columnar", "csv", "delimited"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(default = "default_format_type")]
    pub format_type: String,

    #[serde(default)]
    pub compression: Compression,

    /// Field separator of delimited output.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default)]
    pub batch: BatchLimits,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            format_type: default_format_type(),
            compression: Compression::default(),
            delimiter: default_delimiter(),
            batch: BatchLimits::default(),
        }
    }
}

fn default_format_type() -> String {
    "jsonl".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Output compression. Text formats are wrapped, parquet switches its page codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    #[serde(alias = "gz")]
    Gzip,
}

/// Drain thresholds of a stream's open batch. A value of 0 disables that limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            max_bytes: default_max_bytes(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl BatchLimits {
    pub fn unbounded() -> Self {
        Self {
            max_records: 0,
            max_bytes: 0,
            max_age_secs: 0,
        }
    }
}

fn default_max_records() -> usize {
    10_000
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_max_age_secs() -> u64 {
    300
}
