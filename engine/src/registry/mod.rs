//! Application keyword registry and resolver
//!
//! Maps a free-text phrase to a known application descriptor. The
//! registry is loaded once from configuration at startup and is
//! immutable afterwards; adding an application is a configuration
//! change, not a runtime operation.
//!
//! Matching is deliberately simple: exact name/command equality first,
//! then first keyword-substring hit in registry insertion order. No
//! tokenization or stemming is performed, so a keyword that happens to
//! be a substring of an unrelated word can false-positive (e.g. a "cal"
//! keyword matching inside "calculator"). Entries are ordered so longer,
//! more specific keywords are checked first to bias correctness; that
//! ordering is a documented dependency, not an algorithmic guarantee.

use sdk::errors::EngineError;
use sdk::types::TaskCategory;
use serde::{Deserialize, Serialize};

/// Static record binding an application to its launch command and
/// matching keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDescriptor {
    /// Canonical application name
    pub name: String,

    /// Launch command identifier handed to the agent
    pub command: String,

    /// Browser URL fallback for web-reachable applications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_url: Option<String>,

    /// Keywords matched against the phrase, most specific first
    pub keywords: Vec<String>,

    /// Task category dispatched for this application
    #[serde(default)]
    pub category: TaskCategory,
}

/// Ordered, immutable application registry
#[derive(Debug, Clone)]
pub struct AppRegistry {
    entries: Vec<ApplicationDescriptor>,
}

impl AppRegistry {
    /// Build a registry from descriptors, preserving their order.
    ///
    /// Every descriptor must carry at least one keyword.
    pub fn new(entries: Vec<ApplicationDescriptor>) -> Result<Self, EngineError> {
        for entry in &entries {
            if entry.keywords.is_empty() {
                return Err(EngineError::Config(format!(
                    "application '{}' has no keywords",
                    entry.name
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Registry with the built-in default applications
    pub fn with_defaults() -> Self {
        Self {
            entries: default_applications(),
        }
    }

    /// All descriptors in registry order
    pub fn entries(&self) -> &[ApplicationDescriptor] {
        &self.entries
    }

    /// Resolve a phrase to an application descriptor.
    ///
    /// Tiered, first match wins:
    /// 1. lower-cased phrase equals a descriptor's name or command
    /// 2. first descriptor (insertion order) with any keyword contained
    ///    in the lower-cased phrase
    ///
    /// `None` is an expected negative result, not an error: the caller
    /// falls through to its generic command path. Empty and
    /// whitespace-only phrases return `None` without scanning.
    pub fn resolve(&self, phrase: &str) -> Option<&ApplicationDescriptor> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return None;
        }

        // Tier 1: exact name or command match
        if let Some(hit) = self
            .entries
            .iter()
            .find(|d| d.name.to_lowercase() == phrase || d.command.to_lowercase() == phrase)
        {
            return Some(hit);
        }

        // Tier 2: first keyword substring hit in registry order
        self.entries
            .iter()
            .find(|d| d.keywords.iter().any(|k| phrase.contains(&k.to_lowercase())))
    }
}

/// Built-in application registry used when the config lists none.
///
/// Order matters: "calendar" precedes entries whose keywords could
/// swallow its phrases, and longer keywords come before shorter ones
/// within each entry.
pub fn default_applications() -> Vec<ApplicationDescriptor> {
    vec![
        ApplicationDescriptor {
            name: "Google Chrome".to_string(),
            command: "chrome".to_string(),
            browser_url: Some("https://www.google.com".to_string()),
            keywords: vec!["chrome".to_string(), "browser".to_string()],
            category: TaskCategory::Web,
        },
        ApplicationDescriptor {
            name: "Gmail".to_string(),
            command: "gmail".to_string(),
            browser_url: Some("https://mail.google.com".to_string()),
            keywords: vec!["gmail".to_string(), "mail".to_string(), "email".to_string()],
            category: TaskCategory::Email,
        },
        ApplicationDescriptor {
            name: "Outlook".to_string(),
            command: "outlook".to_string(),
            browser_url: Some("https://outlook.live.com".to_string()),
            keywords: vec!["outlook".to_string()],
            category: TaskCategory::Email,
        },
        ApplicationDescriptor {
            name: "Calendar".to_string(),
            command: "calendar".to_string(),
            browser_url: Some("https://calendar.google.com".to_string()),
            keywords: vec!["calendar".to_string(), "schedule".to_string()],
            category: TaskCategory::Calendar,
        },
        ApplicationDescriptor {
            name: "Twitter".to_string(),
            command: "twitter".to_string(),
            browser_url: Some("https://twitter.com".to_string()),
            keywords: vec!["twitter".to_string(), "tweet".to_string()],
            category: TaskCategory::Social,
        },
        ApplicationDescriptor {
            name: "Excel".to_string(),
            command: "excel".to_string(),
            browser_url: None,
            keywords: vec!["excel".to_string(), "spreadsheet".to_string()],
            category: TaskCategory::Data,
        },
        ApplicationDescriptor {
            name: "Notepad".to_string(),
            command: "notepad".to_string(),
            browser_url: None,
            keywords: vec!["notepad".to_string(), "notes".to_string()],
            category: TaskCategory::Custom,
        },
    ]
}
