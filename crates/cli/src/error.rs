use engine_config::error::ConfigError;
use engine_runtime::error::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink run failed: {0}")]
    Runner(#[from] RuntimeError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
