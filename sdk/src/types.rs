//! Task and work data types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category of an automation task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Email,
    Social,
    Data,
    Web,
    Calendar,
    #[default]
    Custom,
}

/// Lifecycle status of an automation task
///
/// Transitions are monotone: Pending → Running → (Completed | Failed).
/// A terminal status is never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether this status permits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Read-only view of an automation task handed to callers for display
///
/// The task itself is owned by the lifecycle engine; snapshots are
/// cheap clones taken at observation time. `result` is present only
/// when `status` is `Completed`, `error` only when `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub category: TaskCategory,
    pub action: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of internal retries consumed before the terminal status
    pub retries_used: u32,
}
