//! Valet SDK
//!
//! Shared library providing the error taxonomy, task data types, and the
//! agent transport capability trait used by the Valet engine. A real
//! automation agent integration implements [`transport::AgentTransport`]
//! against this crate without depending on the engine itself.

/// Error types and handling
pub mod errors;

/// Agent transport capability trait
pub mod transport;

/// Task and work data types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ValetErrorExt};
pub use transport::{AgentTransport, WorkOrder, WorkStatus};
pub use types::{TaskCategory, TaskSnapshot, TaskStatus};
