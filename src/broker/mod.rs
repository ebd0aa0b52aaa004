//! The `broker` module holds the broadcast engine shared by both listeners
//! and the payload types it moves between them.

pub mod engine;
pub mod message;

pub use engine::{BroadcastReport, Broadcaster};
pub use message::{Direction, Payload, RelayedMessage};
