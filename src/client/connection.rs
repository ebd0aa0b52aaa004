//! Connection handles
//!
//! A `Connection` models one accepted socket from either side of the relay.
//! It carries the sending side of a per-connection outbound queue and a
//! shutdown signal; the task that owns the socket holds the receiving side
//! and drains it into the transport. Cloning a `Connection` is cheap and
//! every clone refers to the same socket.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use crate::broker::message::Payload;
use crate::config::{OverflowPolicy, RelaySettings};
use crate::utils::DeliveryError;

/// Identity of one physical connection. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which listener a connection came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Raw TCP byte stream (devices and simulators).
    Stream,
    /// WebSocket frames (dashboards).
    Frame,
}

impl TransportKind {
    /// The registry this kind's messages are broadcast to.
    pub fn opposite(self) -> Self {
        match self {
            Self::Stream => Self::Frame,
            Self::Frame => Self::Stream,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => f.write_str("stream"),
            Self::Frame => f.write_str("frame"),
        }
    }
}

#[derive(Debug, Clone)]
enum OutboundSender {
    Unbounded(mpsc::UnboundedSender<Payload>),
    Bounded(mpsc::Sender<Payload>),
}

#[derive(Debug)]
enum OutboundReceiverInner {
    Unbounded(mpsc::UnboundedReceiver<Payload>),
    Bounded(mpsc::Receiver<Payload>),
}

/// Receiving side of a connection's outbound queue, owned by its writer task.
#[derive(Debug)]
pub struct OutboundReceiver(OutboundReceiverInner);

impl OutboundReceiver {
    /// Next payload to write, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Payload> {
        match &mut self.0 {
            OutboundReceiverInner::Unbounded(rx) => rx.recv().await,
            OutboundReceiverInner::Bounded(rx) => rx.recv().await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub kind: TransportKind,
    pub peer: SocketAddr,
    pub connected_at: DateTime<Utc>,
    sender: OutboundSender,
    overflow_policy: OverflowPolicy,
    shutdown: Arc<Notify>,
}

impl Connection {
    /// Create a connection handle and the receiving side of its outbound queue.
    ///
    /// A zero `outbound_queue_capacity` gives an unbounded queue.
    pub fn new(
        kind: TransportKind,
        peer: SocketAddr,
        settings: &RelaySettings,
    ) -> (Self, OutboundReceiver) {
        let (sender, receiver) = match settings.outbound_queue_capacity {
            0 => {
                let (tx, rx) = mpsc::unbounded_channel();
                (
                    OutboundSender::Unbounded(tx),
                    OutboundReceiverInner::Unbounded(rx),
                )
            }
            capacity => {
                let (tx, rx) = mpsc::channel(capacity);
                (
                    OutboundSender::Bounded(tx),
                    OutboundReceiverInner::Bounded(rx),
                )
            }
        };

        let connection = Self {
            id: ConnectionId::generate(),
            kind,
            peer,
            connected_at: Utc::now(),
            sender,
            overflow_policy: settings.overflow_policy,
            shutdown: Arc::new(Notify::new()),
        };

        (connection, OutboundReceiver(receiver))
    }

    /// Queue `payload` for this connection without waiting.
    ///
    /// A full bounded queue is handled according to the overflow policy: the
    /// payload is dropped, and with `OverflowPolicy::Disconnect` the
    /// connection is also asked to shut down.
    pub fn deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
        match &self.sender {
            OutboundSender::Unbounded(tx) => tx.send(payload).map_err(|_| DeliveryError::Closed),
            OutboundSender::Bounded(tx) => match tx.try_send(payload) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Closed(_)) => Err(DeliveryError::Closed),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let disconnected = self.overflow_policy == OverflowPolicy::Disconnect;
                    if disconnected {
                        self.close();
                    }
                    Err(DeliveryError::Overflow { disconnected })
                }
            },
        }
    }

    /// Ask the task serving this connection to tear it down.
    ///
    /// The signal is latched, so a close issued before the task starts
    /// waiting is not lost.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once [`Connection::close`] has been called on any clone.
    pub async fn closed(&self) {
        self.shutdown.notified().await;
    }
}
