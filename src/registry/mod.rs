//! Connection registry
//!
//! One `Registry` exists per transport kind. It maps connection ids to live
//! connection handles and is the only mutable state shared between
//! connection tasks.
//!
//! Concurrency notes:
//! - Every method takes the internal lock for the duration of a map
//!   operation only. No lock is held across `.await` or network I/O.
//! - `snapshot` copies the member list; iterate the copy, not the registry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::{Connection, ConnectionId, TransportKind};
use crate::utils::RelayError;

#[derive(Debug)]
pub struct Registry {
    kind: TransportKind,
    limit: Option<usize>,
    members: Mutex<HashMap<ConnectionId, Connection>>,
}

impl Registry {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            limit: None,
            members: Mutex::new(HashMap::new()),
        }
    }

    /// A registry that refuses to grow past `limit` members.
    pub fn with_limit(kind: TransportKind, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Insert a newly accepted connection.
    ///
    /// Fails if the id is already present, the connection belongs to the
    /// other transport kind, or the registry is at its limit. The limit is
    /// checked under the same lock as the insert.
    pub fn add(&self, connection: Connection) -> Result<(), RelayError> {
        if connection.kind != self.kind {
            return Err(RelayError::KindMismatch {
                connection: connection.id,
                expected: self.kind,
                actual: connection.kind,
            });
        }

        let mut members = self.lock();
        if members.contains_key(&connection.id) {
            return Err(RelayError::DuplicateConnection(connection.id));
        }
        match self.limit {
            Some(limit) if members.len() >= limit => {
                return Err(RelayError::RegistryFull {
                    kind: self.kind,
                    limit,
                });
            }
            _ => {}
        }
        members.insert(connection.id, connection);
        Ok(())
    }

    /// Remove a connection. Removing an absent id is a no-op and returns `None`.
    pub fn remove(&self, id: &ConnectionId) -> Option<Connection> {
        self.lock().remove(id)
    }

    /// Point-in-time copy of the current members.
    pub fn snapshot(&self) -> Vec<Connection> {
        self.lock().values().cloned().collect()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Connection>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
