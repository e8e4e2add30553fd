//! Async event bus — carries pipeline events to whoever renders them.
//!
//! Uses a bounded `tokio::sync::mpsc` channel. The coordinator only ever
//! holds a sender, so it stays agnostic of how the UI consumes events.

use super::types::{EventEnvelope, PipelineEvent};
use tokio::sync::mpsc;
use tracing::warn;

/// Publishing half of the event channel.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    /// Publish an event. A dropped receiver is logged, not propagated:
    /// losing the UI must not fail a pipeline run.
    pub async fn publish(&self, event: PipelineEvent) {
        let name = event.name();
        if self.tx.send(EventEnvelope::new(event)).await.is_err() {
            warn!(event = name, "event receiver dropped");
        }
    }
}

/// The event bus connecting the pipeline coordinator → UI boundary.
pub struct EventBus {
    sender: EventSender,
    rx: tokio::sync::Mutex<mpsc::Receiver<EventEnvelope>>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(buffer_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer_size);
        EventBus {
            sender: EventSender { tx },
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Get a clone of the sender (for the coordinator to publish with).
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Publish directly through the bus.
    pub async fn publish(&self, event: PipelineEvent) {
        self.sender.publish(event).await
    }

    /// Consume the next event (waits until available).
    /// Returns None if all senders are dropped.
    pub async fn next(&self) -> Option<EventEnvelope> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Take every event already queued, without waiting.
    pub async fn drain(&self) -> Vec<PipelineEvent> {
        let mut rx = self.rx.lock().await;
        let mut events = Vec::new();
        while let Ok(env) = rx.try_recv() {
            events.push(env.event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalizedAnswer, PipelineKind};

    #[tokio::test]
    async fn test_event_flow() {
        let bus = EventBus::new(10);
        bus.publish(PipelineEvent::Start).await;

        let received = bus.next().await.unwrap();
        assert_eq!(received.event, PipelineEvent::Start);
    }

    #[tokio::test]
    async fn test_event_ordering() {
        let bus = EventBus::new(10);
        let sender = bus.sender();

        sender.publish(PipelineEvent::Start).await;
        sender
            .publish(PipelineEvent::progress(PipelineKind::Solve, "extracting", 30))
            .await;
        sender
            .publish(PipelineEvent::SolutionSuccess(NormalizedAnswer::analysis("done")))
            .await;

        let names: Vec<&str> = bus.drain().await.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["start", "progress", "solution-success"]);
    }

    #[tokio::test]
    async fn test_drain_empty() {
        let bus = EventBus::new(4);
        assert!(bus.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_receiver_dropped_does_not_panic() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        drop(bus);
        sender.publish(PipelineEvent::DebugStart).await;
    }

    #[tokio::test]
    async fn test_multiple_producers() {
        let bus = std::sync::Arc::new(EventBus::new(10));
        let s1 = bus.sender();
        let s2 = bus.sender();

        let h1 = tokio::spawn(async move { s1.publish(PipelineEvent::Start).await });
        let h2 = tokio::spawn(async move { s2.publish(PipelineEvent::DebugStart).await });
        h1.await.unwrap();
        h2.await.unwrap();

        let names: Vec<&str> = bus.drain().await.iter().map(|e| e.name()).collect();
        assert!(names.contains(&"start"));
        assert!(names.contains(&"debug-start"));
    }
}
