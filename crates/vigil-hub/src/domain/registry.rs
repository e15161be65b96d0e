//! Live validator connection registry.
//!
//! Tracks the validators currently attached over WebSocket. Entries exist
//! only between a verified signup and the connection closing; persistent
//! validator identity lives in storage, not here.

use parking_lot::RwLock;
use shared_crypto::Ed25519PublicKey;
use shared_types::ValidatorId;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identity of one WebSocket connection, assigned at upgrade time.
///
/// Distinct from [`ValidatorId`]: a validator gets a fresh `ConnectionId`
/// every time it reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Assign a fresh connection identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live, signature-verified validator connection.
#[derive(Debug, Clone)]
pub struct RegisteredValidator {
    /// Persistent identity from storage.
    pub validator_id: ValidatorId,
    /// The connection this registration is bound to.
    pub connection: ConnectionId,
    /// Key captured at signup; replies are verified against this, never
    /// against a key supplied by the reply itself.
    pub public_key: Ed25519PublicKey,
}

/// In-memory set of currently-connected validators.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    connections: RwLock<HashMap<ConnectionId, RegisteredValidator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the entry for a freshly verified signup.
    ///
    /// Any prior live entry holding the same public key is evicted in the
    /// same critical section, so overlapping reconnect windows leave exactly
    /// one registration per key. Returns the evicted connection, if any.
    pub fn register(&self, entry: RegisteredValidator) -> Option<ConnectionId> {
        let mut connections = self.connections.write();

        let stale = connections
            .iter()
            .find(|(conn, live)| live.public_key == entry.public_key && **conn != entry.connection)
            .map(|(conn, _)| *conn);

        if let Some(conn) = stale {
            connections.remove(&conn);
        }

        connections.insert(entry.connection, entry);
        stale
    }

    /// Remove the entry bound to `connection`.
    ///
    /// No-op `None` when the connection closed before completing signup.
    pub fn unregister(&self, connection: &ConnectionId) -> Option<RegisteredValidator> {
        self.connections.write().remove(connection)
    }

    /// Snapshot of all live registrations for the scheduler's fan-out.
    ///
    /// Iteration order is unspecified.
    pub fn snapshot(&self) -> Vec<RegisteredValidator> {
        self.connections.read().values().cloned().collect()
    }

    /// Whether any live registration holds `public_key`.
    pub fn contains_key(&self, public_key: &Ed25519PublicKey) -> bool {
        self.connections
            .read()
            .values()
            .any(|live| live.public_key == *public_key)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
