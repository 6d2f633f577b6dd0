//! Personality responder module
//!
//! Derives contextual greeting text from conversation state: the
//! configured welcome template, a mention of the chronologically nearest
//! upcoming event, and (with the humor trait enabled) an occasional
//! joke. Humor makes the responder non-deterministic by design, so both
//! the clock and the randomness source are injected; tests pin them.

use crate::clock::Clock;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Probability of appending a joke when humor is enabled
const HUMOR_PROBABILITY: f64 = 0.2;

/// Fixed joke set drawn from uniformly at random
const JOKES: [&str; 4] = [
    "I'd tell you a UDP joke, but you might not get it.",
    "I asked the calendar for a day off. It said it was fully booked.",
    "My other process is a daemon.",
    "I never lose files. They just become very well hidden.",
];

/// Register of speech for the responder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    #[default]
    Casual,
    Professional,
    Formal,
}

/// A future event the responder may mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingEvent {
    /// When the event occurs
    pub at: DateTime<Utc>,
    /// Short description, e.g. "Project deadline"
    pub description: String,
}

/// Conversation state read by the responder
///
/// Mutated only through explicit setters; the last-interaction timestamp
/// is refreshed on every user interaction and polled by the UI for its
/// idle policy.
#[derive(Debug, Clone)]
pub struct ConversationState {
    welcome_template: String,
    humor: bool,
    proactive: bool,
    formality: Formality,
    upcoming: Vec<UpcomingEvent>,
    last_interaction: DateTime<Utc>,
}

impl ConversationState {
    /// State with the given template and a last interaction of `now`
    pub fn new(welcome_template: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            welcome_template: welcome_template.into(),
            humor: false,
            proactive: true,
            formality: Formality::default(),
            upcoming: Vec::new(),
            last_interaction: now,
        }
    }

    pub fn set_humor(&mut self, humor: bool) {
        self.humor = humor;
    }

    pub fn set_proactive(&mut self, proactive: bool) {
        self.proactive = proactive;
    }

    pub fn set_formality(&mut self, formality: Formality) {
        self.formality = formality;
    }

    pub fn humor(&self) -> bool {
        self.humor
    }

    pub fn formality(&self) -> Formality {
        self.formality
    }

    /// Append an upcoming event
    pub fn add_event(&mut self, at: DateTime<Utc>, description: impl Into<String>) {
        self.upcoming.push(UpcomingEvent {
            at,
            description: description.into(),
        });
    }

    /// Ordered list of upcoming events
    pub fn upcoming(&self) -> &[UpcomingEvent] {
        &self.upcoming
    }

    /// Record a user interaction at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_interaction = now;
    }

    /// Timestamp of the most recent user interaction
    pub fn last_interaction(&self) -> DateTime<Utc> {
        self.last_interaction
    }
}

/// Greeting generator with injected clock and randomness
pub struct PersonaResponder {
    clock: Arc<dyn Clock>,
    rng: Mutex<ChaCha8Rng>,
}

impl PersonaResponder {
    /// Responder seeded from OS entropy
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Responder with a fixed seed, for deterministic tests
    pub fn with_seed(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            clock,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Compose the welcome message for the given state.
    ///
    /// Starts from the welcome template. When upcoming events exist, the
    /// chronologically nearest strictly-future one is named along with
    /// the number of days until it, partial days rounding up. With humor
    /// enabled, a joke is appended with probability 0.2.
    pub fn welcome_message(&self, state: &ConversationState) -> String {
        let now = self.clock.now();
        let mut message = state.welcome_template.clone();

        if let Some(event) = nearest_future_event(state.upcoming(), now) {
            let days = days_until(now, event.at);
            message.push_str(&format!(
                " Just so you know, {} is in {} day{}.",
                event.description,
                days,
                if days == 1 { "" } else { "s" }
            ));
        }

        if state.humor() {
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            if rng.gen::<f64>() < HUMOR_PROBABILITY {
                let joke = JOKES[rng.gen_range(0..JOKES.len())];
                message.push(' ');
                message.push_str(joke);
            }
        }

        message
    }

    /// How long the user has been silent
    pub fn idle_for(&self, state: &ConversationState) -> ChronoDuration {
        self.clock.now() - state.last_interaction()
    }
}

/// Earliest event strictly in the future, if any
fn nearest_future_event(
    events: &[UpcomingEvent],
    now: DateTime<Utc>,
) -> Option<&UpcomingEvent> {
    events.iter().filter(|e| e.at > now).min_by_key(|e| e.at)
}

/// Whole days until `at`, partial days rounding up
fn days_until(now: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let secs = (at - now).num_seconds().max(0);
    (secs + 86_399) / 86_400
}
