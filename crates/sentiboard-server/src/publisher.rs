//! Fan-out of dashboard events to connected SSE clients.

use std::sync::Arc;

use axum::response::sse::Event;
use tokio::sync::broadcast;

use crate::aggregate::DashboardSnapshot;
use crate::settings::ConfigSnapshot;

/// Events buffered per subscriber before a slow client starts missing them.
const CHANNEL_CAPACITY: usize = 64;

/// A named event pushed to every subscriber.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Update(Arc<DashboardSnapshot>),
    Config(ConfigSnapshot),
    InitializationError(String),
}

impl DashboardEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update_data",
            Self::Config(_) => "config_data",
            Self::InitializationError(_) => "initialization_error",
        }
    }

    /// Encode as an SSE frame with the event name and a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_sse(&self) -> Result<Event, axum::Error> {
        let event = Event::default().event(self.name());
        match self {
            Self::Update(snapshot) => event.json_data(snapshot.as_ref()),
            Self::Config(config) => event.json_data(config),
            Self::InitializationError(message) => {
                event.json_data(serde_json::json!({ "error": message }))
            }
        }
    }
}

/// Fire-and-forget broadcaster. Subscribers that are gone or lagging simply miss events.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Push `event` to every current subscriber and return how many received it.
    pub fn broadcast(&self, event: DashboardEvent) -> usize {
        let name = event.name();
        // An error only means nobody is listening.
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::debug!(event = name, subscribers = delivered, "broadcast event");
        delivered
    }

    pub fn publish_snapshot(&self, snapshot: DashboardSnapshot) -> usize {
        self.broadcast(DashboardEvent::Update(Arc::new(snapshot)))
    }
}
