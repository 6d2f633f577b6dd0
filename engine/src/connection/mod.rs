//! Agent connection lifecycle module
//!
//! Owns the connect/disconnect state machine and the session token for
//! the external automation agent. The manager is an explicitly owned
//! object injected into the lifecycle engine and orchestrator, never a
//! process global, so tests can substitute a fake transport behind it.
//!
//! States: Disconnected → Connecting → Connected. Transitions are
//! serialized internally; `is_connected()` is a pure query safe from any
//! concurrent caller.

pub mod simulated;

pub use simulated::SimulatedAgent;

use crate::bus::{Event, MessageBus};
use sdk::errors::EngineError;
use sdk::transport::AgentTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Internal link state
#[derive(Debug, Clone)]
enum LinkState {
    Disconnected,
    Connecting,
    Connected { token: String },
}

/// Connect/disconnect lifecycle for the automation agent link
pub struct ConnectionManager {
    transport: Arc<dyn AgentTransport>,
    bus: Arc<MessageBus>,
    // Transitions are serialized by this lock; the flag mirrors the
    // Connected state for lock-free reads.
    state: tokio::sync::Mutex<LinkState>,
    connected: AtomicBool,
}

impl ConnectionManager {
    /// Create a manager over the given transport, initially disconnected
    pub fn new(transport: Arc<dyn AgentTransport>, bus: Arc<MessageBus>) -> Self {
        Self {
            transport,
            bus,
            state: tokio::sync::Mutex::new(LinkState::Disconnected),
            connected: AtomicBool::new(false),
        }
    }

    /// Open the agent link with the given credential.
    ///
    /// A no-op returning success when already connected. On rejection the
    /// manager returns to Disconnected and surfaces
    /// `AuthenticationFailed`; the manager remains usable afterwards.
    pub async fn connect(&self, credential: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        if matches!(*state, LinkState::Connected { .. }) {
            return Ok(());
        }

        *state = LinkState::Connecting;
        info!("connecting to automation agent");

        match self.transport.connect(credential).await {
            Ok(token) => {
                *state = LinkState::Connected { token };
                self.connected.store(true, Ordering::SeqCst);
                info!("agent connection established");
                self.bus.publish(Event::ConnectionChanged { connected: true });
                Ok(())
            }
            Err(e) => {
                *state = LinkState::Disconnected;
                self.connected.store(false, Ordering::SeqCst);
                warn!("agent rejected credential: {}", e);
                match e {
                    EngineError::AuthenticationFailed(_) => Err(e),
                    other => Err(EngineError::AuthenticationFailed(other.to_string())),
                }
            }
        }
    }

    /// Close the agent link and clear the session token.
    ///
    /// Idempotent: a no-op when already disconnected.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, LinkState::Disconnected) {
            return;
        }

        *state = LinkState::Disconnected;
        self.connected.store(false, Ordering::SeqCst);
        info!("agent connection closed");
        self.bus
            .publish(Event::ConnectionChanged { connected: false });
    }

    /// Whether the link is currently connected. Pure query, no side
    /// effects; callers must not cache the answer across suspension
    /// points.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Current session token, present iff connected
    pub async fn session_token(&self) -> Option<String> {
        match &*self.state.lock().await {
            LinkState::Connected { token } => Some(token.clone()),
            _ => None,
        }
    }
}
