//! Simulated automation agent
//!
//! Reference `AgentTransport` implementation used by the CLI and by
//! tests. No process is launched and nothing touches the OS: connect
//! succeeds after a fixed configurable delay, submitted work advances a
//! fixed progress step per poll, and screen captures return a stub
//! payload. Failure behavior is scriptable so tests can exercise the
//! retry and error paths deterministically.

use sdk::errors::EngineError;
use sdk::transport::{AgentTransport, WorkOrder, WorkStatus};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Scripted outcome for the next submitted work item
#[derive(Debug, Clone)]
enum Outcome {
    Succeed,
    Fail { reason: String, transient: bool },
}

#[derive(Debug)]
struct Job {
    order: WorkOrder,
    progress: u8,
    outcome: Outcome,
}

/// In-process stand-in for the external automation agent
pub struct SimulatedAgent {
    connect_delay: Duration,
    /// Progress gained on each poll, 1..=100
    progress_step: u8,
    jobs: Mutex<HashMap<String, Job>>,
    script: Mutex<VecDeque<Outcome>>,
}

impl SimulatedAgent {
    /// Agent with the given handshake delay and per-poll progress step
    pub fn new(connect_delay: Duration, progress_step: u8) -> Self {
        Self {
            connect_delay,
            progress_step: progress_step.clamp(1, 100),
            jobs: Mutex::new(HashMap::new()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Agent with no delays, completing work in two polls. For tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, 50)
    }

    /// Script the next submitted work item to fail.
    ///
    /// Scripted failures are consumed in FIFO order; unscripted work
    /// succeeds.
    pub fn fail_next(&self, reason: &str, transient: bool) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Outcome::Fail {
                reason: reason.to_string(),
                transient,
            });
    }
}

#[async_trait]
impl AgentTransport for SimulatedAgent {
    async fn connect(&self, credential: &str) -> Result<String, EngineError> {
        if credential.trim().is_empty() {
            return Err(EngineError::AuthenticationFailed(
                "empty credential".to_string(),
            ));
        }

        tokio::time::sleep(self.connect_delay).await;
        Ok(format!("session-{}", Uuid::new_v4()))
    }

    async fn submit_work(&self, order: WorkOrder) -> Result<String, EngineError> {
        let work_id = Uuid::new_v4().to_string();
        let outcome = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or(Outcome::Succeed);

        debug!("simulated agent accepted work {} ({})", work_id, order.action);
        self.jobs.lock().expect("jobs lock poisoned").insert(
            work_id.clone(),
            Job {
                order,
                progress: 0,
                outcome,
            },
        );
        Ok(work_id)
    }

    async fn poll_status(&self, work_id: &str) -> Result<WorkStatus, EngineError> {
        let mut jobs = self.jobs.lock().expect("jobs lock poisoned");
        let job = jobs
            .get_mut(work_id)
            .ok_or_else(|| EngineError::Agent(format!("unknown work id {}", work_id)))?;

        if job.progress == 0 {
            job.progress = self.progress_step;
            return Ok(WorkStatus::Queued);
        }

        if job.progress < 100 {
            let status = WorkStatus::Running {
                progress: job.progress,
                frame: None,
            };
            job.progress = job.progress.saturating_add(self.progress_step).min(100);
            return Ok(status);
        }

        let job = jobs.remove(work_id).expect("job present");
        match job.outcome {
            Outcome::Succeed => Ok(WorkStatus::Done {
                output: json!({
                    "action": job.order.action,
                    "category": job.order.category,
                    "status": "ok",
                }),
            }),
            Outcome::Fail { reason, transient } => Ok(WorkStatus::Failed {
                error: reason,
                transient,
            }),
        }
    }

    async fn capture_screen(&self, selector: Option<&str>) -> Result<Vec<u8>, EngineError> {
        let target = selector.unwrap_or("fullscreen");
        let mut payload = b"SIMFRAME:".to_vec();
        payload.extend_from_slice(target.as_bytes());
        Ok(payload)
    }

    async fn cancel(&self, work_id: &str) -> Result<(), EngineError> {
        self.jobs.lock().expect("jobs lock poisoned").remove(work_id);
        Ok(())
    }
}
