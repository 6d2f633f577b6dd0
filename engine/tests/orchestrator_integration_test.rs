use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use sdk::errors::EngineError;
use sdk::types::{TaskCategory, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use valet_engine::bus::MessageBus;
use valet_engine::clock::FixedClock;
use valet_engine::config::Config;
use valet_engine::connection::SimulatedAgent;
use valet_engine::lifecycle::SubmitOptions;
use valet_engine::orchestrator::Orchestrator;
use valet_engine::persona::PersonaResponder;

fn fast_config() -> Config {
    let mut config = Config::default_config();
    config.agent.connect_delay_ms = 0;
    config.agent.poll_interval_ms = 1;
    config.agent.retry_delay_ms = 0;
    config
}

fn orchestrator() -> Orchestrator {
    let config = fast_config();
    Orchestrator::from_config(
        &config,
        Arc::new(SimulatedAgent::instant()),
        Arc::new(MessageBus::new()),
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())),
    )
    .unwrap()
}

#[tokio::test]
async fn test_end_to_end_open_chrome() {
    let orchestrator = orchestrator();

    orchestrator.connect("abc").await.unwrap();
    assert!(orchestrator.is_connected());

    let app = orchestrator.resolve("open chrome").unwrap();
    assert_eq!(app.name, "Google Chrome");
    assert_eq!(app.category, TaskCategory::Web);

    let options = SubmitOptions {
        timeout: Some(Duration::from_secs(5)),
        ..SubmitOptions::default()
    };
    let snapshot = orchestrator
        .handle_command_with("open chrome", options)
        .await
        .unwrap();

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.category, TaskCategory::Web);
    assert_eq!(snapshot.action, "open");
    assert_eq!(
        snapshot.parameters.get("command").and_then(|v| v.as_str()),
        Some("chrome")
    );
}

#[tokio::test]
async fn test_unresolved_phrase_uses_generic_path() {
    let orchestrator = orchestrator();
    orchestrator.connect("abc").await.unwrap();

    let snapshot = orchestrator
        .handle_command("summarize my week")
        .await
        .unwrap();

    assert_eq!(snapshot.category, TaskCategory::Custom);
    assert_eq!(snapshot.action, "execute");
    assert_eq!(
        snapshot.parameters.get("phrase").and_then(|v| v.as_str()),
        Some("summarize my week")
    );
}

#[tokio::test]
async fn test_disconnect_round_trip_blocks_submit() {
    let orchestrator = orchestrator();

    orchestrator.connect("abc").await.unwrap();
    orchestrator.disconnect().await;
    assert!(!orchestrator.is_connected());

    let err = orchestrator
        .handle_command("open chrome")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotConnected));

    // No task ever reached running
    assert!(orchestrator.tasks().is_empty());
}

#[tokio::test]
async fn test_welcome_message_mentions_nearest_event() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let config = fast_config();
    let clock = Arc::new(FixedClock(now));
    let orchestrator = Orchestrator::from_config(
        &config,
        Arc::new(SimulatedAgent::instant()),
        Arc::new(MessageBus::new()),
        clock.clone(),
    )
    .unwrap()
    .with_responder(PersonaResponder::with_seed(clock, 42));

    orchestrator.update_state(|state| {
        state.set_humor(false);
        state.add_event(now + ChronoDuration::days(2), "Project deadline");
        state.add_event(now + ChronoDuration::days(5), "Team meeting");
    });

    let message = orchestrator.welcome_message();
    assert!(message.contains("Project deadline"));
    assert!(!message.contains("Team meeting"));
}

#[tokio::test]
async fn test_command_refreshes_last_interaction() {
    let orchestrator = orchestrator();
    orchestrator.connect("abc").await.unwrap();

    orchestrator.update_state(|state| {
        state.touch(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
    });
    assert_eq!(orchestrator.idle_for(), ChronoDuration::hours(1));

    orchestrator.handle_command("open chrome").await.unwrap();
    assert_eq!(orchestrator.idle_for(), ChronoDuration::zero());
}
