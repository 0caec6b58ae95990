use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use crate::{BusError, Envelope, MessageBus, MessageStream, Result};

#[derive(Debug, Default)]
struct BusState {
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Envelope>>>,
    closed: bool,
}

/// In-process message bus.
///
/// Each subscription owns an unbounded queue, so publishing never blocks.
/// Messages live only in memory and are lost when the process exits.
/// Cloning yields another handle to the same bus.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageBus {
    state: Arc<RwLock<BusState>>,
}

impl InMemoryMessageBus {
    /// Creates a new open bus with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the bus.
    ///
    /// Every open subscription stream ends after yielding the messages
    /// already queued for it, and later publishes fail with
    /// [`BusError::Closed`].
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.closed = true;
        state.subscribers.clear();
        tracing::info!("message bus closed");
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Returns the number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.state
            .read()
            .await
            .subscribers
            .get(topic)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, envelope: Envelope) -> Result<usize> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(BusError::Closed);
        }

        let topic = envelope.topic.clone();
        let delivered = match state.subscribers.get_mut(&topic) {
            Some(senders) => {
                // Dropped subscriptions are pruned on the way through.
                senders.retain(|tx| tx.send(envelope.clone()).is_ok());
                senders.len()
            }
            None => 0,
        };

        if delivered == 0 {
            tracing::debug!(%topic, message_id = %envelope.message_id, "no subscribers, message dropped");
        }
        metrics::counter!("bus_messages_published_total", "topic" => topic).increment(1);

        Ok(delivered)
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        use futures_util::stream;

        let mut state = self.state.write().await;
        if state.closed {
            return Err(BusError::Closed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        tracing::debug!(%topic, "subscription opened");

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|envelope| (envelope, rx))
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = InMemoryMessageBus::new();
        let mut sub = bus.subscribe("a").await.unwrap();

        let delivered = bus
            .publish(Envelope::new("a", serde_json::json!(1)))
            .await
            .unwrap();
        assert_eq!(delivered, 1);

        let envelope = sub.next().await.unwrap();
        assert_eq!(envelope.payload, serde_json::json!(1));
    }

    #[tokio::test]
    async fn publish_without_subscribers_drops() {
        let bus = InMemoryMessageBus::new();
        let delivered = bus
            .publish(Envelope::new("nobody", serde_json::json!(null)))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let bus = InMemoryMessageBus::new();
        let sub = bus.subscribe("a").await.unwrap();
        assert_eq!(bus.subscriber_count("a").await, 1);
        drop(sub);

        let delivered = bus
            .publish(Envelope::new("a", serde_json::json!(1)))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(bus.subscriber_count("a").await, 0);
    }

    #[tokio::test]
    async fn closed_bus_rejects_publish_and_subscribe() {
        let bus = InMemoryMessageBus::new();
        bus.close().await;
        assert!(bus.is_closed().await);
        assert!(matches!(
            bus.publish(Envelope::new("a", serde_json::json!(1))).await,
            Err(BusError::Closed)
        ));
        assert!(matches!(bus.subscribe("a").await, Err(BusError::Closed)));
    }
}
