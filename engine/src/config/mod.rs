//! Configuration management
//!
//! This module handles loading, validation, and management of the Valet
//! configuration. Configuration is stored in TOML format at
//! ~/.valet/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **agent**: Connection delay, poll cadence, default timeout/retry policy
//! - **persona**: Welcome template and personality traits
//! - **applications**: The keyword registry (one `[[applications]]` table
//!   per entry); when absent, a built-in default set is used
//!
//! The configuration system expands `~` to the user's home directory and
//! creates the data directory on first load.

use crate::persona::Formality;
use crate::registry::{default_applications, ApplicationDescriptor};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Agent connection and task policy settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Personality responder settings
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Application keyword registry
    #[serde(default = "default_applications")]
    pub applications: Vec<ApplicationDescriptor>,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// Agent connection and task policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Credential presented on connect
    #[serde(default)]
    pub credential: Option<String>,

    /// Simulated connect handshake delay in milliseconds
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,

    /// Interval between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Default per-task timeout in seconds
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Default number of retries for transient task failures
    #[serde(default = "default_task_retries")]
    pub task_retries: u32,

    /// Base delay between retries in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            credential: None,
            connect_delay_ms: default_connect_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            task_timeout_secs: default_task_timeout_secs(),
            task_retries: default_task_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl AgentConfig {
    /// Connect delay as a `Duration`
    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Default task timeout as a `Duration`
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Retry base delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Personality responder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Welcome message template
    #[serde(default = "default_welcome_template")]
    pub welcome_template: String,

    /// Occasionally append a joke to greetings
    #[serde(default)]
    pub humor: bool,

    /// Volunteer reminders without being asked
    #[serde(default = "default_true")]
    pub proactive: bool,

    /// Register of speech
    #[serde(default)]
    pub formality: Formality,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            welcome_template: default_welcome_template(),
            humor: false,
            proactive: true,
            formality: Formality::default(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.valet")
}

fn default_connect_delay_ms() -> u64 {
    400
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_task_timeout_secs() -> u64 {
    120
}

fn default_task_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_welcome_template() -> String {
    "Welcome back. How can I help you today?".to_string()
}

impl Config {
    /// Load configuration from the default location (~/.valet/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration and writes it out. Validates the configuration after
    /// loading.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            let mut config = Self::default_config();
            config.validate()?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    EngineError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
            let toml_string = toml::to_string_pretty(&config)
                .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
            fs::write(&path, toml_string)
                .map_err(|e| EngineError::Config(format!("Failed to write config: {}", e)))?;

            Ok(config)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read {:?}: {}", path, e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration with the built-in application registry
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            agent: AgentConfig::default(),
            persona: PersonaConfig::default(),
            applications: default_applications(),
        }
    }

    /// Default configuration file path (~/.valet/config.toml)
    pub fn default_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".valet").join("config.toml"))
    }

    /// Validate the configuration and expand paths
    ///
    /// Checks that every registry entry carries keywords and that the
    /// poll interval is non-zero, then expands and creates the data
    /// directory.
    pub fn validate(&mut self) -> Result<(), EngineError> {
        for app in &self.applications {
            if app.keywords.is_empty() {
                return Err(EngineError::Config(format!(
                    "application '{}' has no keywords",
                    app.name
                )));
            }
        }

        if self.agent.poll_interval_ms == 0 {
            return Err(EngineError::Config(
                "agent.poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
