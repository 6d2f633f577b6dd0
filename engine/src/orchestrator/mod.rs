//! Orchestrator façade composing the core components
//!
//! Accepts a raw command string, resolves it against the application
//! registry, builds a task draft, and submits it through the lifecycle
//! engine, which requires an active agent connection. Every component
//! is explicitly constructed and injected so tests can substitute fake
//! transports, clocks, and seeds.

use crate::bus::MessageBus;
use crate::clock::Clock;
use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::lifecycle::{SubmitOptions, TaskDraft, TaskEngine};
use crate::persona::{ConversationState, PersonaResponder};
use crate::registry::{AppRegistry, ApplicationDescriptor};
use sdk::errors::EngineError;
use sdk::transport::AgentTransport;
use sdk::types::TaskSnapshot;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Composes resolver, connection, lifecycle engine, and persona
pub struct Orchestrator {
    registry: AppRegistry,
    link: Arc<ConnectionManager>,
    engine: Arc<TaskEngine>,
    responder: PersonaResponder,
    state: Mutex<ConversationState>,
    clock: Arc<dyn Clock>,
    default_timeout: Duration,
    default_retries: u32,
}

impl Orchestrator {
    /// Build the full component graph from configuration
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn AgentTransport>,
        bus: Arc<MessageBus>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let registry = AppRegistry::new(config.applications.clone())?;
        let link = Arc::new(ConnectionManager::new(transport.clone(), bus.clone()));
        let engine = Arc::new(TaskEngine::new(
            link.clone(),
            transport,
            bus,
            config.agent.poll_interval(),
            config.agent.retry_delay(),
        ));

        let mut state = ConversationState::new(&config.persona.welcome_template, clock.now());
        state.set_humor(config.persona.humor);
        state.set_proactive(config.persona.proactive);
        state.set_formality(config.persona.formality);

        Ok(Self {
            registry,
            link,
            engine,
            responder: PersonaResponder::new(clock.clone()),
            state: Mutex::new(state),
            clock,
            default_timeout: config.agent.task_timeout(),
            default_retries: config.agent.task_retries,
        })
    }

    /// Replace the responder, e.g. with a seeded one in tests
    pub fn with_responder(mut self, responder: PersonaResponder) -> Self {
        self.responder = responder;
        self
    }

    /// Resolve a phrase against the application registry.
    ///
    /// `None` means no automation is bound to the phrase; the caller
    /// falls through to the generic command path.
    pub fn resolve(&self, phrase: &str) -> Option<&ApplicationDescriptor> {
        self.registry.resolve(phrase)
    }

    /// Resolve a command and run it to its terminal status with the
    /// configured default timeout and retry policy
    pub async fn handle_command(&self, phrase: &str) -> Result<TaskSnapshot, EngineError> {
        let options = SubmitOptions {
            timeout: Some(self.default_timeout),
            retries: self.default_retries,
            ..SubmitOptions::default()
        };
        self.handle_command_with(phrase, options).await
    }

    /// Resolve a command and run it with explicit options
    pub async fn handle_command_with(
        &self,
        phrase: &str,
        options: SubmitOptions,
    ) -> Result<TaskSnapshot, EngineError> {
        self.touch();

        let draft = match self.registry.resolve(phrase) {
            Some(app) => {
                debug!("resolved '{}' to {}", phrase, app.name);
                let mut draft = TaskDraft::action("open")
                    .with_category(app.category)
                    .with_param("command", json!(app.command))
                    .with_param("phrase", json!(phrase));
                if let Some(url) = &app.browser_url {
                    draft = draft.with_param("url", json!(url));
                }
                draft
            }
            None => {
                debug!("no application bound to '{}', using generic path", phrase);
                TaskDraft::default().with_param("phrase", json!(phrase))
            }
        };

        self.engine.submit(draft, options).await
    }

    /// Open the agent link with the given credential
    pub async fn connect(&self, credential: &str) -> Result<(), EngineError> {
        self.link.connect(credential).await
    }

    /// Close the agent link
    pub async fn disconnect(&self) {
        self.link.disconnect().await
    }

    /// Whether the agent link is up
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Capture the agent-side screen; `None` means full screen
    pub async fn capture_screen(&self, selector: Option<&str>) -> Result<Vec<u8>, EngineError> {
        self.engine.capture_screen(selector).await
    }

    /// Best-effort stop of all non-terminal tasks
    pub fn stop_all(&self) {
        self.engine.stop_all()
    }

    /// Snapshots of every submitted task
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        self.engine.tasks()
    }

    /// Compose the greeting for the current conversation state
    pub fn welcome_message(&self) -> String {
        let state = self.state.lock().expect("state lock poisoned");
        self.responder.welcome_message(&state)
    }

    /// Record a user interaction now
    pub fn touch(&self) {
        let now = self.clock.now();
        self.state.lock().expect("state lock poisoned").touch(now);
    }

    /// How long the user has been silent
    pub fn idle_for(&self) -> chrono::Duration {
        let state = self.state.lock().expect("state lock poisoned");
        self.responder.idle_for(&state)
    }

    /// Mutate conversation state through explicit setters
    pub fn update_state(&self, f: impl FnOnce(&mut ConversationState)) {
        let mut state = self.state.lock().expect("state lock poisoned");
        f(&mut state);
    }
}
