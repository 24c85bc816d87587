use crate::{
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{format::registry::FormatRegistry, singer::SingerReader};
use engine_config::settings::TargetConfig;
use engine_runtime::execution::{executor, factory};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "blobsink",
    version = "0.1.0",
    about = "Stores Singer record streams as batches in blob storage"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // stdout carries state messages, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = execute(cli.command).await;
    match &outcome {
        Err(CliError::ShutdownRequested) | Ok(()) => {}
        Err(err) => error!(error = %err, "Command failed"),
    }
    std::process::exit(ExitCode::for_outcome(&outcome).as_i32());
}

async fn execute(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run {
            config,
            input,
            report,
        } => run(&config, input.as_deref(), report.as_deref()).await,
        Commands::Validate { config, resolved } => {
            let config = TargetConfig::from_file(&config)?;
            info!(
                format = %config.format.format_type,
                provider = ?config.cloud_provider.cloud_provider_type,
                "Configuration is valid"
            );
            if resolved {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
        Commands::Formats => {
            for name in FormatRegistry::default().names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn run(path: &str, input: Option<&str>, report: Option<&str>) -> Result<(), CliError> {
    let config = Arc::new(TargetConfig::from_file(path)?);
    let sink = factory::create_sink(&config)?;

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let state_out = tokio::io::stdout();
    let result = match input {
        Some(file) => {
            let file = tokio::fs::File::open(file).await?;
            let source = SingerReader::new(BufReader::new(file));
            executor::run(config, sink, source, state_out, shutdown.cancel_token()).await
        }
        None => {
            let source = SingerReader::new(BufReader::new(tokio::io::stdin()));
            executor::run(config, sink, source, state_out, shutdown.cancel_token()).await
        }
    };

    let summary = result?;
    match report {
        Some(path) => output::write_report(&summary, path).await?,
        None => output::print_report(&summary)?,
    }

    if shutdown.is_shutdown_requested() {
        return Err(CliError::ShutdownRequested);
    }
    Ok(())
}
