//! Structured log-event stream for external observers.
//!
//! The daemon is the only producer. Each subscriber gets a small bounded
//! queue; a subscriber that stops draining is treated as dead and dropped —
//! the producer never blocks on a slow reader.

use chrono::Local;
use serde::Serialize;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Mutex;

const SUBSCRIBER_QUEUE: usize = 64;

/// One event on the stream: `{"type": ..., "time": "HH:MM:SS", "msg": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub msg: String,
}

impl LogEvent {
    pub fn new(kind: &str, msg: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            time: Local::now().format("%H:%M:%S").to_string(),
            msg: msg.into(),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<SyncSender<LogEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<LogEvent> {
        let (tx, rx) = sync_channel(SUBSCRIBER_QUEUE);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Deliver to every live subscriber. Full and disconnected queues are
    /// dropped in the same pass.
    pub fn publish(&self, event: LogEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|tx| !matches!(
            tx.try_send(event.clone()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_))
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_the_wire_field_names() {
        let event = LogEvent::new("status", "published");
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "status");
        assert_eq!(value["msg"], "published");
        let time = value["time"].as_str().expect("time string");
        assert_eq!(time.len(), 8);
        assert_eq!(time.as_bytes()[2], b':');
        assert_eq!(time.as_bytes()[5], b':');
    }

    #[test]
    fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.publish(LogEvent::new("info", "hello"));
        let event = rx.recv().expect("event");
        assert_eq!(event.kind, "info");
        assert_eq!(event.msg, "hello");
    }

    #[test]
    fn full_subscriber_queue_drops_the_subscriber() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        for i in 0..=SUBSCRIBER_QUEUE {
            bus.publish(LogEvent::new("tick", format!("{}", i)));
        }
        // The overflowing publish removed the subscriber, so its sender is
        // gone: draining the queued events eventually hits a disconnect.
        let drained = rx.iter().count();
        assert_eq!(drained, SUBSCRIBER_QUEUE);
    }

    #[test]
    fn dropped_subscriber_does_not_block_publishing() {
        let bus = EventBus::new();
        drop(bus.subscribe());
        bus.publish(LogEvent::new("info", "still fine"));
    }
}
