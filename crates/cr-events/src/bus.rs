use crate::types::EventRecord;
use tokio::sync::broadcast;

/// Fan-out of committed mutation events to in-process listeners.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns how many listeners saw the event. Nobody listening is not an
    /// error; the event is already persisted.
    pub fn publish(&self, event: EventRecord) -> usize {
        let seq = event.seq;
        match self.sender.send(event) {
            Ok(delivered) => {
                tracing::trace!(seq, delivered, "event published");
                delivered
            }
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventSource;
    use chrono::Utc;
    use serde_json::json;

    fn record(seq: i64) -> EventRecord {
        EventRecord {
            id: format!("evt_{seq}"),
            seq,
            at: Utc::now(),
            correlation_id: None,
            source: EventSource::Cli,
            body: json!({"type": "RepositoryCreated"}),
        }
    }

    #[test]
    fn publish_without_listeners_drops_the_event() {
        let bus = EventBus::new(4);
        assert_eq!(bus.listeners(), 0);
        assert_eq!(bus.publish(record(1)), 0);
    }

    #[test]
    fn listeners_receive_in_order() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(record(1)), 1);
        bus.publish(record(2));
        assert_eq!(rx.try_recv().unwrap().seq, 1);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.kind(), Some("RepositoryCreated"));
    }
}
