use serde::Serialize;
use tokio::sync::broadcast;

use crate::timer::Completion;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Celebration {
    SessionCompleted,
    TaskCompleted,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    SessionCompleted(Completion),
    Celebrate { reason: Celebration },
    UpsellRequested { item: String },
    TasksChanged { total: usize, completed: usize },
}

/// Fan-out of one-shot notifications to whatever front end is listening.
/// Timer state itself is observed through the controller's watch channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Having no subscribers is fine; the event is dropped.
    pub fn emit(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }
}
