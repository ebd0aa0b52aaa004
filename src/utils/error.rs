//! The `error` module defines the error types used within `robobridge`.
//!
//! `RelayError` covers failures that belong to the process or to a registry
//! operation. `DeliveryError` covers a single failed hand-off of a payload to
//! one recipient; the broadcast engine logs and swallows it.

use thiserror::Error;

use crate::client::{ConnectionId, TransportKind};

#[derive(Debug, Error)]
pub enum RelayError {
    /// A listening socket could not be bound. Fatal at startup.
    #[error("failed to bind {kind} listener on {addr}: {source}")]
    Bind {
        kind: TransportKind,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),

    #[error("{connection} is a {actual} connection, registry only holds {expected} connections")]
    KindMismatch {
        connection: ConnectionId,
        expected: TransportKind,
        actual: TransportKind,
    },

    /// The registry already holds `limit` connections.
    #[error("{kind} registry is full ({limit} connections)")]
    RegistryFull { kind: TransportKind, limit: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a payload could not be queued for a recipient.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("recipient queue is closed")]
    Closed,

    #[error("recipient queue is full (disconnected: {disconnected})")]
    Overflow { disconnected: bool },
}

impl RelayError {
    pub fn bind(kind: TransportKind, addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            kind,
            addr: addr.into(),
            source,
        }
    }
}
