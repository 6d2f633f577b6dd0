use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::transport::{AgentTransport, WorkOrder, WorkStatus};
use sdk::types::TaskStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use valet_engine::bus::{Event, EventType, MessageBus};
use valet_engine::connection::{ConnectionManager, SimulatedAgent};
use valet_engine::lifecycle::{SubmitOptions, TaskDraft, TaskEngine};

/// Transport whose work never finishes. Used to exercise timeout and
/// stop paths without real agent behavior.
struct StalledAgent {
    cancels: AtomicUsize,
}

impl StalledAgent {
    fn new() -> Self {
        Self {
            cancels: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AgentTransport for StalledAgent {
    async fn connect(&self, _credential: &str) -> Result<String, EngineError> {
        Ok("session-stalled".to_string())
    }

    async fn submit_work(&self, _order: WorkOrder) -> Result<String, EngineError> {
        Ok("work-stalled".to_string())
    }

    async fn poll_status(&self, _work_id: &str) -> Result<WorkStatus, EngineError> {
        Ok(WorkStatus::Running {
            progress: 10,
            frame: None,
        })
    }

    async fn capture_screen(&self, _selector: Option<&str>) -> Result<Vec<u8>, EngineError> {
        Ok(vec![0u8; 4])
    }

    async fn cancel(&self, _work_id: &str) -> Result<(), EngineError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn engine_over(transport: Arc<dyn AgentTransport>) -> (Arc<ConnectionManager>, Arc<TaskEngine>) {
    let bus = Arc::new(MessageBus::new());
    let link = Arc::new(ConnectionManager::new(transport.clone(), bus.clone()));
    let engine = Arc::new(TaskEngine::new(
        link.clone(),
        transport,
        bus,
        Duration::from_millis(1),
        Duration::ZERO,
    ));
    (link, engine)
}

#[tokio::test]
async fn test_progress_is_monotone_and_precedes_terminal() {
    let (link, engine) = engine_over(Arc::new(SimulatedAgent::instant()));
    link.connect("abc").await.unwrap();

    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = SubmitOptions {
        on_progress: Some(Arc::new(move |percent| {
            sink.lock().unwrap().push(percent);
        })),
        ..SubmitOptions::default()
    };

    let snapshot = engine.submit(TaskDraft::default(), options).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);

    // All progress callbacks ran before submit resolved with the
    // terminal snapshot; values are non-decreasing and end at 100.
    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test]
async fn test_timeout_forces_failure() {
    let (link, engine) = engine_over(Arc::new(StalledAgent::new()));
    link.connect("abc").await.unwrap();

    let options = SubmitOptions {
        timeout: Some(Duration::from_millis(50)),
        ..SubmitOptions::default()
    };
    let snapshot = engine.submit(TaskDraft::default(), options).await.unwrap();

    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("timeout exceeded"));
}

#[tokio::test]
async fn test_stop_all_leaves_no_task_running() {
    let transport = Arc::new(StalledAgent::new());
    let (link, engine) = engine_over(transport.clone());
    link.connect("abc").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit(TaskDraft::default(), SubmitOptions::default())
                .await
        }));
    }

    // Let the submissions reach their poll loops
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.stop_all();

    for handle in handles {
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("stopped by user"));
    }

    assert!(engine
        .tasks()
        .iter()
        .all(|t| t.status != TaskStatus::Running && t.status != TaskStatus::Pending));

    // Driving loops cancelled their agent-side work on observing the stop
    assert_eq!(transport.cancels.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_stop_race_yields_one_terminal_event_per_task() {
    let transport = Arc::new(StalledAgent::new());
    let bus = Arc::new(MessageBus::new());
    let mut rx = bus.subscribe(EventType::TaskFailed);
    let link = Arc::new(ConnectionManager::new(transport.clone(), bus.clone()));
    let engine = Arc::new(TaskEngine::new(
        link.clone(),
        transport,
        bus,
        Duration::from_millis(1),
        Duration::ZERO,
    ));
    link.connect("abc").await.unwrap();

    let handle = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .submit(TaskDraft::default(), SubmitOptions::default())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.stop_all();

    let snapshot = handle.await.unwrap().unwrap();
    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("stopped by user"));

    // Even though stop_all and the in-flight submit race to finish the
    // task, only the transition that landed gets published.
    let mut failures = 0;
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        if let Event::TaskFailed { task_id, .. } = event {
            assert_eq!(task_id, snapshot.id);
            failures += 1;
        }
    }
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_timeout_cancels_agent_side_work() {
    let transport = Arc::new(StalledAgent::new());
    let (link, engine) = engine_over(transport.clone());
    link.connect("abc").await.unwrap();

    let options = SubmitOptions {
        timeout: Some(Duration::from_millis(50)),
        ..SubmitOptions::default()
    };
    let snapshot = engine.submit(TaskDraft::default(), options).await.unwrap();
    assert_eq!(snapshot.error.as_deref(), Some("timeout exceeded"));

    // The abandoned work item was cancelled on the agent side
    assert_eq!(transport.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stop_all_while_disconnected_is_noop() {
    let (_link, engine) = engine_over(Arc::new(SimulatedAgent::instant()));
    // Never connected, nothing submitted: must not panic or error
    engine.stop_all();
    assert!(engine.tasks().is_empty());
}

#[tokio::test]
async fn test_stop_all_leaves_terminal_tasks_untouched() {
    let (link, engine) = engine_over(Arc::new(SimulatedAgent::instant()));
    link.connect("abc").await.unwrap();

    let snapshot = engine
        .submit(TaskDraft::default(), SubmitOptions::default())
        .await
        .unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);

    engine.stop_all();

    let after = engine.tasks();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].status, TaskStatus::Completed);
    assert!(after[0].error.is_none());
}

#[tokio::test]
async fn test_retries_exhaust_into_final_failure() {
    let transport = Arc::new(SimulatedAgent::instant());
    transport.fail_next("agent busy", true);
    transport.fail_next("agent busy", true);
    transport.fail_next("agent busy", true);
    let (link, engine) = engine_over(transport);
    link.connect("abc").await.unwrap();

    let options = SubmitOptions {
        retries: 2,
        ..SubmitOptions::default()
    };
    let snapshot = engine.submit(TaskDraft::default(), options).await.unwrap();

    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("agent busy"));
    assert_eq!(snapshot.retries_used, 2);
}

#[tokio::test]
async fn test_concurrent_tasks_do_not_interfere() {
    let (link, engine) = engine_over(Arc::new(SimulatedAgent::instant()));
    link.connect("abc").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit(TaskDraft::action(format!("job-{}", i)), SubmitOptions::default())
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        ids.push(snapshot.id);
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
