use thiserror::Error;

/// Errors raised while loading or validating the target configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported format type: {0}")]
    UnknownFormat(String),

    #[error("Missing '{0}' settings for the selected cloud provider")]
    MissingProviderSettings(&'static str),

    #[error("Configuration validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}
