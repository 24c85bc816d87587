use crate::error::CliError;
use engine_runtime::execution::executor::RunSummary;

fn generate_report_json(summary: &RunSummary) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(summary)?;
    Ok(json)
}

pub async fn write_report(summary: &RunSummary, path: &str) -> Result<(), CliError> {
    let report_json = generate_report_json(summary)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

/// Report goes to stderr, stdout carries state messages.
pub fn print_report(summary: &RunSummary) -> Result<(), CliError> {
    let report_json = generate_report_json(summary)?;
    eprintln!("{report_json}");
    Ok(())
}
