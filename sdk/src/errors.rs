//! Error types and handling
//!
//! This module provides the error types used throughout the Valet engine.
//! All errors implement the `ValetErrorExt` trait which provides
//! user-friendly hints and classifies failures as transient (retry
//! eligible) or permanent.
//!
//! Task-execution failures are folded into the task's terminal state by
//! the lifecycle engine; only connection and validation errors surface to
//! callers as failed operations. A phrase that resolves to no application
//! is an expected negative result, not an error, and has no variant here.

use thiserror::Error;

/// Trait for Valet error extensions
///
/// Provides additional context for errors: a hint safe to display to end
/// users, and whether the failure is transient. Transient failures are
/// eligible for the lifecycle engine's retry policy; permanent failures
/// are surfaced immediately.
pub trait ValetErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the failure is transient (retry eligible)
    fn is_transient(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Connection**: operations that require an active agent link
/// - **Authentication**: credential rejected by the agent
/// - **Timeout**: task forcibly failed by a caller-specified deadline
/// - **Task**: work reported failed by the agent (transient or permanent)
/// - **Configuration**: invalid or missing configuration
/// - **Agent**: transport-level faults from the agent collaborator
#[derive(Debug, Error)]
pub enum EngineError {
    /// Operation requires an active agent connection
    #[error("not connected to automation agent")]
    NotConnected,

    /// The agent rejected the supplied credential
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A caller-specified task deadline elapsed before a terminal state
    #[error("timeout exceeded")]
    TimeoutExceeded,

    /// The agent reported the work as failed
    #[error("task failed: {reason}")]
    TaskFailed {
        /// Agent-reported failure description
        reason: String,
        /// Whether the failure is retry eligible
        transient: bool,
    },

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Transport-level agent faults
    #[error("agent error: {0}")]
    Agent(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValetErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::NotConnected => "Connect to the automation agent first",
            Self::AuthenticationFailed(_) => "Check your agent credential and try again",
            Self::TimeoutExceeded => "The task took too long. Try a larger timeout",
            Self::TaskFailed { transient, .. } => {
                if *transient {
                    "A temporary agent failure occurred. Trying again may succeed"
                } else {
                    "The agent could not complete this task"
                }
            }
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Agent(_) => "The automation agent misbehaved. Check its logs",
            Self::Io(_) => "A file system operation failed",
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            Self::TaskFailed { transient, .. } => *transient,
            Self::Agent(_) => true,
            Self::NotConnected
            | Self::AuthenticationFailed(_)
            | Self::TimeoutExceeded
            | Self::Config(_)
            | Self::Io(_) => false,
        }
    }
}
