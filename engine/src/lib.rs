//! Valet Engine Library
//!
//! Command resolution and automation orchestration core: maps free-text
//! commands to known applications, dispatches tasks to an automation
//! agent, and tracks each task's lifecycle. Used by both the `valet`
//! binary and integration tests.

/// Configuration management module
pub mod config;

/// Injectable time source
pub mod clock;

/// Event bus for engine-to-UI notifications
pub mod bus;

/// Application keyword registry and resolver
pub mod registry;

/// Agent connection lifecycle module
pub mod connection;

/// Task lifecycle engine module
pub mod lifecycle;

/// Personality responder module
pub mod persona;

/// Orchestrator façade composing the core components
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
