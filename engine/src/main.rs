// Valet automation front end
// Main entry point for the valet binary

use clap::Parser;
use valet_engine::cli::{Cli, Command};
use valet_engine::config::Config;
use valet_engine::handlers::{
    handle_apps, handle_capture, handle_greet, handle_resolve, handle_run, handle_stop,
    OutputFormat,
};
use valet_engine::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    init_telemetry(cli.log.as_deref(), Some(config.core.log_level.as_str()));

    tracing::info!("Valet v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run {
            phrase,
            timeout,
            retries,
        } => handle_run(phrase, timeout, retries, &config, format).await,

        Command::Resolve { phrase } => handle_resolve(phrase, &config, format).await,

        Command::Apps => handle_apps(&config, format).await,

        Command::Greet => handle_greet(&config, format).await,

        Command::Capture { selector } => handle_capture(selector, &config, format).await,

        Command::Stop => handle_stop(&config, format).await,
    }
}
