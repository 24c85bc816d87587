use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Read Singer messages and store them as batches
    Run {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Read messages from this file instead of stdin")]
        input: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the JSON run summary to this file"
        )]
        report: Option<String>,
    },
    /// Load and validate a config file without reading any input
    Validate {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Print the config with all defaults applied")]
        resolved: bool,
    },
    /// List the supported output formats
    Formats,
}
