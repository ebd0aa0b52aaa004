//! The `client` module defines the representation of one connected socket.
//!
//! It provides the `Connection` handle shared by the registries, the
//! broadcast engine and the listener tasks, together with its identity and
//! transport kind.

pub mod connection;

pub use connection::{Connection, ConnectionId, OutboundReceiver, TransportKind};

#[cfg(test)]
mod tests;
