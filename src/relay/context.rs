//! State shared by both listeners: the two registries and the broadcast
//! engine. Each listener owns admission to its own registry and borrows the
//! other one as the broadcast target.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::audit::TracingAudit;
use crate::broker::{BroadcastReport, Broadcaster, Payload, RelayedMessage};
use crate::client::{Connection, OutboundReceiver, TransportKind};
use crate::config::RelaySettings;
use crate::registry::Registry;
use crate::utils::RelayError;

#[derive(Debug, Clone)]
pub struct RelayContext {
    streams: Arc<Registry>,
    frames: Arc<Registry>,
    broadcaster: Broadcaster,
    settings: RelaySettings,
}

impl RelayContext {
    pub fn new(settings: RelaySettings) -> Self {
        let broadcaster = if settings.audit {
            Broadcaster::with_audit(Arc::new(TracingAudit))
        } else {
            Broadcaster::new()
        };
        Self::with_broadcaster(settings, broadcaster)
    }

    pub fn with_broadcaster(settings: RelaySettings, broadcaster: Broadcaster) -> Self {
        Self {
            streams: Arc::new(Registry::with_limit(
                TransportKind::Stream,
                settings.max_connections,
            )),
            frames: Arc::new(Registry::with_limit(
                TransportKind::Frame,
                settings.max_connections,
            )),
            broadcaster,
            settings,
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn registry(&self, kind: TransportKind) -> &Arc<Registry> {
        match kind {
            TransportKind::Stream => &self.streams,
            TransportKind::Frame => &self.frames,
        }
    }

    /// Create and register a connection for a freshly accepted socket.
    ///
    /// Returns `None` when the registry for `kind` is at `max_connections`;
    /// the caller drops the socket.
    pub fn admit(
        &self,
        kind: TransportKind,
        peer: SocketAddr,
    ) -> Option<(Connection, OutboundReceiver)> {
        let registry = self.registry(kind);
        let (connection, outbound) = Connection::new(kind, peer, &self.settings);
        match registry.add(connection.clone()) {
            Ok(()) => {}
            Err(RelayError::RegistryFull { limit, .. }) => {
                warn!(%kind, %peer, limit, "connection limit reached, rejecting client");
                return None;
            }
            Err(e) => {
                warn!(%kind, %peer, error = %e, "failed to register connection");
                return None;
            }
        }

        info!(
            connection = %connection.id,
            %kind,
            %peer,
            clients = registry.len(),
            "client connected"
        );
        Some((connection, outbound))
    }

    /// Remove `connection` from its registry. Safe to call more than once.
    pub fn release(&self, connection: &Connection) {
        let registry = self.registry(connection.kind);
        if registry.remove(&connection.id).is_some() {
            info!(
                connection = %connection.id,
                kind = %connection.kind,
                peer = %connection.peer,
                clients = registry.len(),
                "client disconnected"
            );
        }
    }

    /// Broadcast a payload received on `origin` to every member of the
    /// opposite registry.
    pub fn relay(&self, origin: &Connection, payload: Payload) -> BroadcastReport {
        let message = RelayedMessage::new(origin.id, origin.kind, payload);
        let targets = self.registry(origin.kind.opposite()).snapshot();
        self.broadcaster.broadcast(&message, &targets)
    }
}
