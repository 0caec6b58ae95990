//! Topic-based publish/subscribe channel.
//!
//! Messages travel as JSON [`Envelope`]s and are decoded into typed payloads
//! by the subscriber. Delivery is best effort: the in-memory implementation
//! keeps nothing once the process exits.

pub mod bus;
pub mod envelope;
pub mod error;
pub mod memory;

pub use bus::{MessageBus, MessageBusExt, MessageStream};
pub use envelope::{Envelope, MessageId};
pub use error::{BusError, Result};
pub use memory::InMemoryMessageBus;
