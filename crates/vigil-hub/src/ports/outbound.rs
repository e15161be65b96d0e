//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the hub **requires** its host environment to
//! implement: the persistent store and frame delivery to attached
//! validator connections.

use crate::domain::registry::ConnectionId;
use async_trait::async_trait;
use shared_types::{HubFrame, MonitoredTarget, NewObservation, NewValidator, Validator};
use thiserror::Error;

/// Errors from the persistent store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be reached or the operation timed out
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness or referential constraint rejected the write
    #[error("storage constraint violated: {0}")]
    Constraint(String),
}

/// Abstract interface to the persistent store.
///
/// The hub treats the store as a single logical transactional resource.
/// Implementations must be `Send + Sync`; calls are the hub's only
/// suspension points, and no in-memory lock is held across them.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Look up a validator row by its hex-encoded public key.
    async fn find_validator_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<Option<Validator>, StorageError>;

    /// Create the validator row for a never-before-seen public key.
    async fn create_validator(&self, validator: NewValidator) -> Result<Validator, StorageError>;

    /// Targets currently eligible for monitoring (`disabled = false`).
    async fn list_enabled_targets(&self) -> Result<Vec<MonitoredTarget>, StorageError>;

    /// Persist one observation and credit the validator's pending payout.
    ///
    /// The two effects are one atomic unit: both commit or neither does.
    /// An observation without its payout (or the reverse) is a correctness
    /// violation, not a degraded success.
    async fn record_observation(
        &self,
        observation: NewObservation,
        reward: u64,
    ) -> Result<(), StorageError>;
}

/// Errors from frame delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The connection is no longer attached
    #[error("connection is no longer attached")]
    Disconnected,

    /// The frame could not be encoded
    #[error("frame could not be encoded")]
    Encoding,
}

/// Fire-and-forget frame delivery to one attached validator connection.
///
/// `send` enqueues without awaiting the peer; delivery beyond the local
/// write queue is not acknowledged. A `Disconnected` error at dispatch time
/// is the caller's cue to cancel the probe it just registered.
pub trait FrameSink: Send + Sync {
    /// Enqueue `frame` for `connection`.
    fn send(&self, connection: ConnectionId, frame: &HubFrame) -> Result<(), SinkError>;
}
