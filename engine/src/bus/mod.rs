//! Event bus for engine-to-UI notifications
//!
//! The presentation layer subscribes here to observe task lifecycle
//! events, progress, screen captures, and connection-state changes
//! without holding references into the engine. Channels are bounded to
//! prevent unbounded memory growth; a slow subscriber drops events
//! rather than blocking the engine.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Channel buffer size for bounded subscriber channels
const CHANNEL_BUFFER_SIZE: usize = 100;

/// Event types that can be published on the bus
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum EventType {
    /// Task has entered running
    TaskStarted,
    /// Task reported a progress percentage
    TaskProgress,
    /// Task has completed successfully
    TaskCompleted,
    /// Task has failed
    TaskFailed,
    /// A screen capture payload was produced
    ScreenCaptured,
    /// Agent connection state changed
    ConnectionChanged,
    /// Subscribe to all event types
    All,
}

/// Events published on the bus
#[derive(Debug, Clone)]
pub enum Event {
    /// Task started with id and action
    TaskStarted { task_id: String, action: String },
    /// Task progress percentage (0..=100)
    TaskProgress { task_id: String, percent: u8 },
    /// Task completed with id
    TaskCompleted { task_id: String },
    /// Task failed with id and error
    TaskFailed { task_id: String, error: String },
    /// Screen capture produced (payload size only; bytes go to the caller)
    ScreenCaptured { bytes: usize },
    /// Agent connection state changed
    ConnectionChanged { connected: bool },
}

impl Event {
    /// Get the event type for this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::TaskStarted { .. } => EventType::TaskStarted,
            Event::TaskProgress { .. } => EventType::TaskProgress,
            Event::TaskCompleted { .. } => EventType::TaskCompleted,
            Event::TaskFailed { .. } => EventType::TaskFailed,
            Event::ScreenCaptured { .. } => EventType::ScreenCaptured,
            Event::ConnectionChanged { .. } => EventType::ConnectionChanged,
        }
    }
}

/// Bounded pub/sub bus between the engine and its observers
///
/// Publishing is synchronous and never blocks: events to subscribers
/// with full channels are dropped. Closed subscriber channels are
/// pruned lazily on publish.
#[derive(Default)]
pub struct MessageBus {
    channels: Mutex<HashMap<EventType, Vec<mpsc::Sender<Event>>>>,
}

impl MessageBus {
    /// Create a new MessageBus
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a specific event type, or `EventType::All` for everything
    pub fn subscribe(&self, event_type: EventType) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut channels = self.channels.lock().expect("bus lock poisoned");
        channels.entry(event_type).or_default().push(tx);
        rx
    }

    /// Publish an event to matching subscribers and `All` subscribers
    pub fn publish(&self, event: Event) {
        let event_type = event.event_type();
        let mut channels = self.channels.lock().expect("bus lock poisoned");

        for key in [event_type, EventType::All] {
            if let Some(senders) = channels.get_mut(&key) {
                senders.retain(|tx| match tx.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("dropping {:?} event for slow subscriber", event_type);
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(EventType::TaskCompleted);

        bus.publish(Event::TaskCompleted {
            task_id: "t1".to_string(),
        });

        match rx.recv().await {
            Some(Event::TaskCompleted { task_id }) => assert_eq!(task_id, "t1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_subscription_sees_every_type() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(EventType::All);

        bus.publish(Event::ConnectionChanged { connected: true });
        bus.publish(Event::TaskFailed {
            task_id: "t2".to_string(),
            error: "stopped by user".to_string(),
        });

        assert!(matches!(
            rx.recv().await,
            Some(Event::ConnectionChanged { connected: true })
        ));
        assert!(matches!(rx.recv().await, Some(Event::TaskFailed { .. })));
    }

    #[tokio::test]
    async fn test_unrelated_subscription_receives_nothing() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(EventType::ScreenCaptured);

        bus.publish(Event::TaskCompleted {
            task_id: "t3".to_string(),
        });

        assert!(rx.try_recv().is_err());
    }
}
