use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::{Envelope, Result};

/// A stream of messages delivered to one subscription.
///
/// The stream ends when the bus is closed.
pub type MessageStream = Pin<Box<dyn Stream<Item = Envelope> + Send>>;

/// Minimal publish/subscribe capability.
///
/// Implementations must be thread-safe (Send + Sync) because one bus is
/// shared by request handlers and background consumers.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes an envelope to its topic.
    ///
    /// Never waits on subscribers. Returns the number of subscriptions the
    /// message was handed to; a topic without subscribers drops the message.
    async fn publish(&self, envelope: Envelope) -> Result<usize>;

    /// Opens a new subscription to `topic`.
    ///
    /// Only messages published after the call are delivered.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}

/// Extension trait providing convenience methods for message buses.
#[async_trait]
pub trait MessageBusExt: MessageBus {
    /// Serializes `message` and publishes it to `topic`.
    async fn publish_json<T>(&self, topic: &str, message: &T) -> Result<usize>
    where
        T: Serialize + Sync,
    {
        self.publish(Envelope::encode(topic, message)?).await
    }
}

// Blanket implementation for all MessageBus implementations
impl<T: MessageBus + ?Sized> MessageBusExt for T {}
