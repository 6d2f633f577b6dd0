//! CLI interface for Valet
//!
//! This module provides the command-line interface using clap's derive
//! API. It defines all commands and global flags for driving the
//! orchestration core from a terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Valet automation front end
///
/// Resolves natural-language commands to known applications and runs
/// them through the automation agent, tracking each task's lifecycle.
#[derive(Parser, Debug)]
#[command(name = "valet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a command and run it to completion
    Run {
        /// The command phrase, e.g. "open chrome"
        phrase: String,

        /// Per-task timeout in seconds (overrides config)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Retries for transient failures (overrides config)
        #[arg(long, value_name = "N")]
        retries: Option<u32>,
    },

    /// Show which application a phrase resolves to, without running it
    Resolve {
        /// The command phrase
        phrase: String,
    },

    /// List the application registry
    Apps,

    /// Print the persona's welcome message
    Greet,

    /// Capture the agent-side screen
    Capture {
        /// Region selector; omit for full screen
        #[arg(long)]
        selector: Option<String>,
    },

    /// Stop all in-flight tasks
    Stop,
}
