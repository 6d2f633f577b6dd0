//! Agent transport capability trait
//!
//! The engine never talks to a real automation agent directly. All
//! agent interaction goes through [`AgentTransport`], which a concrete
//! integration (desktop-control service, remote daemon, or the engine's
//! built-in simulation) implements. The engine owns lifecycle and retry
//! policy; the transport only moves work and status.

use crate::errors::EngineError;
use crate::types::TaskCategory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of work handed to the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub category: TaskCategory,
    pub action: String,
    pub parameters: HashMap<String, serde_json::Value>,
}

/// Agent-reported status of a submitted work item
#[derive(Debug, Clone)]
pub enum WorkStatus {
    /// Accepted but not yet started
    Queued,
    /// In progress; `progress` is 0..=100, `frame` an optional
    /// intermediate screen capture
    Running { progress: u8, frame: Option<Vec<u8>> },
    /// Finished successfully with a result payload
    Done { output: serde_json::Value },
    /// Finished unsuccessfully; `transient` marks retry-eligible faults
    Failed { error: String, transient: bool },
}

/// Capability interface to the external automation agent
///
/// Implementations must be safe to share across tasks: the engine polls
/// status for several work items concurrently over one transport.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Authenticate and open a session. Returns an opaque session token.
    async fn connect(&self, credential: &str) -> Result<String, EngineError>;

    /// Submit a work order. Returns the agent-assigned work id.
    async fn submit_work(&self, order: WorkOrder) -> Result<String, EngineError>;

    /// Poll the status of a previously submitted work item.
    async fn poll_status(&self, work_id: &str) -> Result<WorkStatus, EngineError>;

    /// Capture the agent-side screen. A `None` selector means full screen.
    async fn capture_screen(&self, selector: Option<&str>) -> Result<Vec<u8>, EngineError>;

    /// Best-effort cancellation of a work item.
    async fn cancel(&self, work_id: &str) -> Result<(), EngineError>;
}
