//! Automation task state
//!
//! An [`AutomationTask`] is exclusively owned by the lifecycle engine
//! while it executes; callers only ever see [`TaskSnapshot`] clones.
//! Status transitions are monotone (pending → running → completed |
//! failed) and a terminal status is never reassigned, which makes
//! `stop_all` racing a completing task safe: whichever terminal
//! transition lands first wins and the other becomes a no-op.

use sdk::transport::WorkOrder;
use sdk::types::{TaskCategory, TaskSnapshot, TaskStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Caller-supplied sketch of a task; the engine fills the defaults
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    /// Category; defaults to `custom`
    pub category: Option<TaskCategory>,

    /// Action name; defaults to `"execute"`
    pub action: Option<String>,

    /// Parameter map; defaults to empty
    pub parameters: HashMap<String, serde_json::Value>,
}

impl TaskDraft {
    /// Draft for a named action
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Progress callback: percent in 0..=100, non-decreasing per task
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Screen-capture callback: opaque frame bytes streamed by the agent
pub type FrameFn = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Per-submission execution options
#[derive(Clone, Default)]
pub struct SubmitOptions {
    /// Force-fail the caller-visible task after this duration
    pub timeout: Option<Duration>,

    /// Extra attempts for transient failures
    pub retries: u32,

    /// Base delay between retries, doubled per attempt and capped at
    /// ten times the base. `None` uses the engine's configured default.
    pub retry_delay: Option<Duration>,

    /// Invoked with monotonically non-decreasing percentages while
    /// running, always strictly before the terminal status
    pub on_progress: Option<ProgressFn>,

    /// Invoked for intermediate screen captures; purely observational
    pub on_frame: Option<FrameFn>,
}

impl std::fmt::Debug for SubmitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitOptions")
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_frame", &self.on_frame.is_some())
            .finish()
    }
}

/// One unit of automation work with a tracked lifecycle
#[derive(Debug)]
pub struct AutomationTask {
    id: String,
    category: TaskCategory,
    action: String,
    parameters: HashMap<String, serde_json::Value>,
    status: TaskStatus,
    result: Option<serde_json::Value>,
    error: Option<String>,
    retries_used: u32,
}

impl AutomationTask {
    /// Materialize a task from a draft, filling defaults
    pub fn from_draft(id: String, draft: TaskDraft) -> Self {
        Self {
            id,
            category: draft.category.unwrap_or_default(),
            action: draft.action.unwrap_or_else(|| "execute".to_string()),
            parameters: draft.parameters,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            retries_used: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Whether the task has reached completed or failed
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending → Running. No-op once terminal.
    pub fn begin(&mut self) {
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Running;
        }
    }

    /// Record one consumed retry attempt
    pub fn note_retry(&mut self) {
        self.retries_used += 1;
    }

    /// Transition to Completed with a result payload.
    ///
    /// Returns false (and changes nothing) if the task is already
    /// terminal.
    pub fn complete(&mut self, result: serde_json::Value) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        true
    }

    /// Transition to Failed with an error description.
    ///
    /// Returns false (and changes nothing) if the task is already
    /// terminal.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        true
    }

    /// Work order handed to the agent transport
    pub fn work_order(&self) -> WorkOrder {
        WorkOrder {
            category: self.category,
            action: self.action.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Read-only snapshot for callers
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            category: self.category,
            action: self.action.clone(),
            parameters: self.parameters.clone(),
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
            retries_used: self.retries_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> AutomationTask {
        AutomationTask::from_draft("1-1".to_string(), TaskDraft::default())
    }

    #[test]
    fn test_draft_defaults() {
        let task = task();
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.action(), "execute");
        assert_eq!(task.snapshot().category, TaskCategory::Custom);
        assert!(task.snapshot().parameters.is_empty());
    }

    #[test]
    fn test_monotone_transitions() {
        let mut task = task();
        task.begin();
        assert_eq!(task.status(), TaskStatus::Running);

        assert!(task.complete(json!({"status": "ok"})));
        assert_eq!(task.status(), TaskStatus::Completed);

        // Terminal status is never reassigned
        assert!(!task.fail("late failure"));
        assert_eq!(task.status(), TaskStatus::Completed);
        assert!(task.snapshot().error.is_none());
    }

    #[test]
    fn test_result_and_error_mutually_exclusive() {
        let mut task = task();
        task.begin();
        assert!(task.fail("agent exploded"));

        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert!(snapshot.result.is_none());
        assert_eq!(snapshot.error.as_deref(), Some("agent exploded"));

        // Completing after failure changes nothing
        assert!(!task.complete(json!({})));
        assert!(task.snapshot().result.is_none());
    }

    #[test]
    fn test_begin_after_terminal_is_noop() {
        let mut task = task();
        task.begin();
        task.fail("stopped by user");
        task.begin();
        assert_eq!(task.status(), TaskStatus::Failed);
    }
}
