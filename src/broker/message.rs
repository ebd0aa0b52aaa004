use chrono::{DateTime, Utc};
use tungstenite::protocol::Message as WsMessage;

use crate::client::{ConnectionId, TransportKind};

/// An opaque payload in transit between the two sides of the relay.
///
/// Stream chunks are always `Binary`. WebSocket frames keep their kind so a
/// text frame from a dashboard arrives at other dashboards as text; devices
/// only ever see the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// The bytes written to a TCP socket.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Unwrap a data frame. Control frames (ping, pong, close) carry no payload
    /// to relay and yield `None`.
    pub fn from_ws(message: WsMessage) -> Option<Self> {
        match message {
            WsMessage::Text(text) => Some(Self::Text(text.as_str().to_owned())),
            WsMessage::Binary(bytes) => Some(Self::Binary(bytes.to_vec())),
            _ => None,
        }
    }

    pub fn into_ws(self) -> WsMessage {
        match self {
            Self::Text(text) => WsMessage::text(text),
            Self::Binary(bytes) => WsMessage::binary(bytes),
        }
    }
}

/// Which way a message is travelling through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Telemetry from a device, fanned out to dashboards.
    DeviceToDashboard,
    /// Commands from a dashboard, fanned out to devices.
    DashboardToDevice,
}

impl Direction {
    /// Direction of a message received on a connection of `kind`.
    pub fn from_origin(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Stream => Self::DeviceToDashboard,
            TransportKind::Frame => Self::DashboardToDevice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceToDashboard => "device_to_dashboard",
            Self::DashboardToDevice => "dashboard_to_device",
        }
    }
}

/// A message as received from one connection, before fan-out.
///
/// Nothing keeps a `RelayedMessage` once its broadcast returns.
#[derive(Debug, Clone)]
pub struct RelayedMessage {
    pub origin: ConnectionId,
    pub direction: Direction,
    pub payload: Payload,
    pub received_at: DateTime<Utc>,
}

impl RelayedMessage {
    pub fn new(origin: ConnectionId, kind: TransportKind, payload: Payload) -> Self {
        Self {
            origin,
            direction: Direction::from_origin(kind),
            payload,
            received_at: Utc::now(),
        }
    }
}
