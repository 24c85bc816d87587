pub mod context;
pub mod error;
pub mod format;
pub mod metrics;
pub mod retry;
