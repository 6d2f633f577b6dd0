//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: resolve a phrase and execute it to its terminal status
//! - resolve: show the registry hit for a phrase without executing
//! - apps: list the application registry
//! - greet: print the persona welcome message
//! - capture: capture the agent-side screen to a file
//! - stop: stop all in-flight tasks
//!
//! Handlers build the component graph over the simulated agent; wiring a
//! real transport means swapping the `SimulatedAgent` here.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::MessageBus;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::connection::SimulatedAgent;
use crate::lifecycle::SubmitOptions;
use crate::orchestrator::Orchestrator;
use sdk::types::TaskStatus;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Credential used when the config does not provide one
const DEFAULT_CREDENTIAL: &str = "local-session";

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let transport = Arc::new(SimulatedAgent::new(config.agent.connect_delay(), 25));
    let bus = Arc::new(MessageBus::new());
    Orchestrator::from_config(config, transport, bus, Arc::new(SystemClock))
        .context("Failed to assemble orchestrator")
}

async fn connect(orchestrator: &Orchestrator, config: &Config) -> Result<()> {
    let credential = config
        .agent
        .credential
        .as_deref()
        .unwrap_or(DEFAULT_CREDENTIAL);
    orchestrator
        .connect(credential)
        .await
        .context("Failed to connect to automation agent")
}

/// Resolve a phrase and run it to completion
pub async fn handle_run(
    phrase: String,
    timeout: Option<u64>,
    retries: Option<u32>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    connect(&orchestrator, config).await?;

    let options = SubmitOptions {
        timeout: Some(Duration::from_secs(
            timeout.unwrap_or(config.agent.task_timeout_secs),
        )),
        retries: retries.unwrap_or(config.agent.task_retries),
        on_progress: Some(Arc::new(|percent| {
            tracing::info!("progress: {}%", percent);
        })),
        ..SubmitOptions::default()
    };

    let snapshot = orchestrator.handle_command_with(&phrase, options).await?;
    orchestrator.disconnect().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Text => match snapshot.status {
            TaskStatus::Completed => {
                println!("Task {} completed ({}).", snapshot.id, snapshot.action);
                if snapshot.retries_used > 0 {
                    println!("Recovered after {} retry(ies).", snapshot.retries_used);
                }
            }
            _ => {
                println!(
                    "Task {} failed: {}",
                    snapshot.id,
                    snapshot.error.as_deref().unwrap_or("unknown error")
                );
            }
        },
    }

    Ok(())
}

/// Show the registry hit for a phrase without executing it
pub async fn handle_resolve(phrase: String, config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;

    match orchestrator.resolve(&phrase) {
        Some(app) => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(app)?),
            OutputFormat::Text => {
                println!("'{}' resolves to {} ({})", phrase, app.name, app.command);
            }
        },
        None => match format {
            OutputFormat::Json => println!("{}", json!({ "resolved": null })),
            OutputFormat::Text => {
                println!("No application bound to '{}'; generic path applies.", phrase);
            }
        },
    }

    Ok(())
}

/// List the application registry
pub async fn handle_apps(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.applications)?);
        }
        OutputFormat::Text => {
            for app in &config.applications {
                println!(
                    "{:<16} {:<10} keywords: {}",
                    app.name,
                    app.command,
                    app.keywords.join(", ")
                );
            }
        }
    }

    Ok(())
}

/// Print the persona's welcome message
pub async fn handle_greet(config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let message = orchestrator.welcome_message();

    match format {
        OutputFormat::Json => println!("{}", json!({ "message": message })),
        OutputFormat::Text => println!("{}", message),
    }

    Ok(())
}

/// Capture the agent-side screen to a file in the data directory
pub async fn handle_capture(
    selector: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    connect(&orchestrator, config).await?;

    let image = orchestrator
        .capture_screen(selector.as_deref())
        .await
        .context("Screen capture failed")?;
    orchestrator.disconnect().await;

    let file_name = format!("capture-{}.bin", chrono::Utc::now().timestamp_millis());
    let path = config.core.data_dir.join(file_name);
    std::fs::write(&path, &image).context("Failed to write capture file")?;

    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "path": path, "bytes": image.len() }));
        }
        OutputFormat::Text => {
            println!("Captured {} bytes to {:?}", image.len(), path);
        }
    }

    Ok(())
}

/// Stop all in-flight tasks.
///
/// The CLI builds a fresh component graph per invocation, so there is
/// nothing long-lived to sweep here; the command exists so embedders
/// driving a persistent orchestrator have the same surface. It reports
/// how many tasks it actually stopped.
pub async fn handle_stop(config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    orchestrator.stop_all();

    let stopped = orchestrator
        .tasks()
        .iter()
        .filter(|t| t.error.as_deref() == Some("stopped by user"))
        .count();

    match format {
        OutputFormat::Json => println!("{}", json!({ "stopped": stopped })),
        OutputFormat::Text => {
            if stopped == 0 {
                println!("No tasks to stop.");
            } else {
                println!("Stopped {} task(s).", stopped);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_stop_with_nothing_in_flight() {
        let config = Config::default_config();
        handle_stop(&config, OutputFormat::Text).await.unwrap();
        handle_stop(&config, OutputFormat::Json).await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_resolve_known_and_unknown_phrases() {
        let config = Config::default_config();
        handle_resolve("open chrome".to_string(), &config, OutputFormat::Text)
            .await
            .unwrap();
        handle_resolve("do the dishes".to_string(), &config, OutputFormat::Json)
            .await
            .unwrap();
    }
}
