use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BusError, Result};

/// Unique identifier for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message in transit, with its routing metadata.
///
/// The payload stays untyped JSON until the subscriber decodes it, so a
/// publisher and a subscriber disagreeing on the shape surfaces as
/// [`BusError::Malformed`] instead of a silent mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique identifier for this message.
    pub message_id: MessageId,

    /// Topic the message was published to.
    pub topic: String,

    /// When the message entered the bus.
    pub published_at: DateTime<Utc>,

    /// The message body.
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Wraps a raw JSON payload.
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            message_id: MessageId::new(),
            topic: topic.into(),
            published_at: Utc::now(),
            payload,
        }
    }

    /// Serializes `message` into a new envelope.
    pub fn encode<T: Serialize>(topic: impl Into<String>, message: &T) -> Result<Self> {
        Ok(Self::new(topic, serde_json::to_value(message)?))
    }

    /// Decodes the payload into the message type expected on this topic.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| BusError::Malformed {
            topic: self.topic.clone(),
            reason: e.to_string(),
        })
    }
}
