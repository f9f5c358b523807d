use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::DayKey;

/// Backlog per subscriber before old updates start being dropped. Lagging
/// consumers only ever care about the newest value anyway.
const CHANNEL_CAPACITY: usize = 64;

/// One "steps today" update, published after every admitted accounting event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdate {
    pub day: DayKey,
    pub steps_today: u64,
    pub at: DateTime<Utc>,
}

/// Process-local fan-out of step updates. Subscribing yields an independent
/// receiver tied to the consumer's visible lifetime: drop it to unsubscribe.
/// Publishing never blocks; delivery order across subscribers is unspecified.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<StepUpdate>,
}

impl UpdateBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StepUpdate> {
        self.sender.subscribe()
    }

    /// Send to whoever is listening. No subscribers is not an error.
    pub fn publish(&self, update: StepUpdate) {
        let _ = self.sender.send(update);
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}
