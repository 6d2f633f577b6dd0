//! Task lifecycle engine module
//!
//! Owns every submitted [`AutomationTask`] from acceptance to its
//! terminal status. The engine enforces the lifecycle contract:
//!
//! 1. Submission requires a live agent connection, checked at call time
//! 2. Exactly one terminal status per task (completed or failed)
//! 3. Progress callbacks are non-decreasing and precede the terminal
//!    notification
//! 4. Transient agent failures retry up to the caller's cap with a
//!    doubling, capped backoff; retries are invisible to the caller
//!    beyond the final `retries_used` count
//! 5. A caller-specified timeout force-fails the caller-visible task;
//!    the agent-side work is cancelled best-effort only
//!
//! Tasks run independently: concurrent submissions share nothing but
//! the connection manager and the transport.

pub mod task;

pub use task::{AutomationTask, FrameFn, ProgressFn, SubmitOptions, TaskDraft};

use crate::bus::{Event, MessageBus};
use crate::connection::ConnectionManager;
use sdk::errors::{EngineError, ValetErrorExt};
use sdk::transport::{AgentTransport, WorkStatus};
use sdk::types::TaskSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

type TaskCell = Arc<Mutex<AutomationTask>>;

/// Executes automation tasks against the agent transport
pub struct TaskEngine {
    link: Arc<ConnectionManager>,
    transport: Arc<dyn AgentTransport>,
    bus: Arc<MessageBus>,
    poll_interval: Duration,
    default_retry_delay: Duration,
    tasks: Mutex<Vec<TaskCell>>,
    seq: AtomicU64,
}

impl TaskEngine {
    /// Create an engine over the given connection and transport
    pub fn new(
        link: Arc<ConnectionManager>,
        transport: Arc<dyn AgentTransport>,
        bus: Arc<MessageBus>,
        poll_interval: Duration,
        default_retry_delay: Duration,
    ) -> Self {
        Self {
            link,
            transport,
            bus,
            poll_interval,
            default_retry_delay,
            tasks: Mutex::new(Vec::new()),
            seq: AtomicU64::new(1),
        }
    }

    /// Submit a task and await its terminal status.
    ///
    /// Fails with `NotConnected` before any task state is created when
    /// the agent link is down. Otherwise always resolves to a
    /// well-formed snapshot whose status is `Completed` or `Failed`;
    /// execution failures are folded into the task, never thrown.
    pub async fn submit(
        &self,
        draft: TaskDraft,
        options: SubmitOptions,
    ) -> Result<TaskSnapshot, EngineError> {
        if !self.link.is_connected() {
            return Err(EngineError::NotConnected);
        }

        let cell: TaskCell = Arc::new(Mutex::new(AutomationTask::from_draft(
            self.next_id(),
            draft,
        )));
        self.tasks.lock().expect("tasks lock poisoned").push(cell.clone());

        {
            let mut task = cell.lock().expect("task lock poisoned");
            task.begin();
            info!("task {} running: {}", task.id(), task.action());
            self.bus.publish(Event::TaskStarted {
                task_id: task.id().to_string(),
                action: task.action().to_string(),
            });
        }

        // Monotone progress guard shared across retry attempts
        let mut last_progress = 0u8;
        // Work id of the attempt in flight, for cancellation on timeout
        let active_work: Mutex<Option<String>> = Mutex::new(None);
        let driven = self.drive(&cell, &options, &mut last_progress, &active_work);
        let outcome = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, driven).await {
                Ok(result) => result,
                Err(_) => {
                    let abandoned = active_work.lock().expect("work lock poisoned").take();
                    if let Some(work_id) = abandoned {
                        let _ = self.transport.cancel(&work_id).await;
                    }
                    Err(EngineError::TimeoutExceeded)
                }
            },
            None => driven.await,
        };

        let (snapshot, landed) = {
            let mut task = cell.lock().expect("task lock poisoned");
            // False when stop_all already landed the terminal status and
            // published the terminal event; one transition, one event
            let landed = match outcome {
                Ok(output) => task.complete(output),
                Err(e) => task.fail(failure_text(&e)),
            };
            (task.snapshot(), landed)
        };

        if landed {
            match &snapshot.error {
                None => {
                    info!("task {} completed", snapshot.id);
                    self.bus.publish(Event::TaskCompleted {
                        task_id: snapshot.id.clone(),
                    });
                }
                Some(error) => {
                    warn!("task {} failed: {}", snapshot.id, error);
                    self.bus.publish(Event::TaskFailed {
                        task_id: snapshot.id.clone(),
                        error: error.clone(),
                    });
                }
            }
        }

        Ok(snapshot)
    }

    /// Capture the agent-side screen.
    ///
    /// A `None` selector means full screen. Fails with `NotConnected`
    /// when the link is down.
    pub async fn capture_screen(&self, selector: Option<&str>) -> Result<Vec<u8>, EngineError> {
        if !self.link.is_connected() {
            return Err(EngineError::NotConnected);
        }

        let image = self.transport.capture_screen(selector).await?;
        self.bus.publish(Event::ScreenCaptured { bytes: image.len() });
        Ok(image)
    }

    /// Best-effort stop of every non-terminal task.
    ///
    /// Each such task fails with "stopped by user"; terminal tasks are
    /// left untouched. Driving loops observe the terminal status on
    /// their next poll and cancel their agent-side work. Never an error,
    /// including while disconnected.
    pub fn stop_all(&self) {
        let tasks = self.tasks.lock().expect("tasks lock poisoned").clone();
        for cell in tasks {
            let stopped = {
                let mut task = cell.lock().expect("task lock poisoned");
                if task.fail("stopped by user") {
                    Some(task.snapshot())
                } else {
                    None
                }
            };
            if let Some(snapshot) = stopped {
                info!("task {} stopped by user", snapshot.id);
                self.bus.publish(Event::TaskFailed {
                    task_id: snapshot.id,
                    error: "stopped by user".to_string(),
                });
            }
        }
    }

    /// Read-only snapshots of every submitted task, in submission order
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        self.tasks
            .lock()
            .expect("tasks lock poisoned")
            .iter()
            .map(|cell| cell.lock().expect("task lock poisoned").snapshot())
            .collect()
    }

    /// Run attempts until success, a permanent failure, or retry
    /// exhaustion. Only transient failures retry.
    async fn drive(
        &self,
        cell: &TaskCell,
        options: &SubmitOptions,
        last_progress: &mut u8,
        active_work: &Mutex<Option<String>>,
    ) -> Result<serde_json::Value, EngineError> {
        let base = options.retry_delay.unwrap_or(self.default_retry_delay);
        let mut delay = base;
        let mut attempt: u32 = 0;

        loop {
            match self
                .run_attempt(cell, options, last_progress, active_work)
                .await
            {
                Ok(output) => return Ok(output),
                Err(e) => {
                    // stop_all already finished the task; don't retry it
                    if cell.lock().expect("task lock poisoned").is_terminal() {
                        return Err(e);
                    }
                    if e.is_transient() && attempt < options.retries {
                        attempt += 1;
                        cell.lock().expect("task lock poisoned").note_retry();
                        debug!("retrying after transient failure (attempt {}): {}", attempt, e);
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(base * 10);
                    } else {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// One submit-and-poll pass against the agent
    async fn run_attempt(
        &self,
        cell: &TaskCell,
        options: &SubmitOptions,
        last_progress: &mut u8,
        active_work: &Mutex<Option<String>>,
    ) -> Result<serde_json::Value, EngineError> {
        // Connection state is re-read on every pass, never cached
        if !self.link.is_connected() {
            return Err(EngineError::TaskFailed {
                reason: "agent connection lost".to_string(),
                transient: true,
            });
        }

        let order = cell.lock().expect("task lock poisoned").work_order();
        let work_id = self.transport.submit_work(order).await?;
        *active_work.lock().expect("work lock poisoned") = Some(work_id.clone());

        loop {
            if cell.lock().expect("task lock poisoned").is_terminal() {
                let _ = self.transport.cancel(&work_id).await;
                return Err(EngineError::TaskFailed {
                    reason: "stopped by user".to_string(),
                    transient: false,
                });
            }
            if !self.link.is_connected() {
                return Err(EngineError::TaskFailed {
                    reason: "agent connection lost".to_string(),
                    transient: true,
                });
            }

            match self.transport.poll_status(&work_id).await? {
                WorkStatus::Queued => {}
                WorkStatus::Running { progress, frame } => {
                    if progress > *last_progress {
                        *last_progress = progress.min(100);
                        self.report_progress(cell, options, *last_progress);
                    }
                    if let (Some(frame), Some(on_frame)) = (frame, options.on_frame.as_ref()) {
                        on_frame(&frame);
                    }
                }
                WorkStatus::Done { output } => {
                    active_work.lock().expect("work lock poisoned").take();
                    if *last_progress < 100 {
                        *last_progress = 100;
                        self.report_progress(cell, options, 100);
                    }
                    return Ok(output);
                }
                WorkStatus::Failed { error, transient } => {
                    active_work.lock().expect("work lock poisoned").take();
                    return Err(EngineError::TaskFailed {
                        reason: error,
                        transient,
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn report_progress(&self, cell: &TaskCell, options: &SubmitOptions, percent: u8) {
        if let Some(on_progress) = options.on_progress.as_ref() {
            on_progress(percent);
        }
        let task_id = cell.lock().expect("task lock poisoned").id().to_string();
        self.bus.publish(Event::TaskProgress { task_id, percent });
    }

    /// Timestamp-derived task id with a process-wide sequence suffix
    fn next_id(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", millis, seq)
    }
}

/// Error text recorded on the failed task
fn failure_text(error: &EngineError) -> String {
    match error {
        EngineError::TaskFailed { reason, .. } => reason.clone(),
        EngineError::TimeoutExceeded => "timeout exceeded".to_string(),
        other => other.to_string(),
    }
}
