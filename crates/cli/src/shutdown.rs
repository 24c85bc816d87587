use crate::error::CliError;
use engine_runtime::error::RuntimeError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Turns SIGINT and SIGTERM into a graceful stop of the sink run.
///
/// The first signal cancels the run: no more input is read and every open
/// batch is still stored. A second signal exits at once and leaves open
/// batches unstored.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            this.request(next_signal().await);

            let signal = next_signal().await;
            warn!(signal, "Second signal, exiting without storing open batches");
            std::process::exit(ExitCode::ShutdownRequested.as_i32());
        });
    }

    /// Cancels the run; open batches are finalized by the runner.
    pub fn request(&self, reason: &str) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!(signal = reason, "Shutdown requested, storing open batches");
        }
        self.cancel_token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Waits for SIGINT or SIGTERM and names it. Never resolves when no handler
/// could be installed.
async fn next_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// The run finished but at least one stream could not store its data.
    StreamsFailed = 2,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn for_outcome(outcome: &Result<(), CliError>) -> Self {
        match outcome {
            Ok(()) => ExitCode::Success,
            Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
            Err(CliError::Runner(RuntimeError::StreamsFailed { .. })) => ExitCode::StreamsFailed,
            Err(_) => ExitCode::GeneralError,
        }
    }
}
