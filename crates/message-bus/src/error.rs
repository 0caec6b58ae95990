use thiserror::Error;

/// Errors that can occur when publishing to or consuming from the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus was closed; no further publishes or subscriptions are accepted.
    #[error("message bus is closed")]
    Closed,

    /// A payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A payload arriving on a topic does not have the expected shape.
    #[error("malformed message on topic '{topic}': {reason}")]
    Malformed { topic: String, reason: String },
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
