use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Side effects requested by handlers once their transaction has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// Brigades newly attached to a task; members get a Telegram message.
    BrigadesAssigned { task_id: i64, brigade_ids: Vec<i64> },
    /// A worker was removed from the back office; drop their bot profile.
    WorkerDeleted { telegram_id: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: UnboundedSender<DomainEvent>,
}

impl EventBus {
    pub fn channel() -> (Self, UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!(?event, "Publishing event");
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(event = ?e.0, "Event dropped, dispatcher is not running");
        }
    }
}
