//! Domain entities.
//!
//! These mirror the rows of the persistent store; the hub core only ever
//! touches them through the storage gateway.

use crate::ids::{ObservationId, TargetId, ValidatorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one uptime check, as reported by a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UptimeStatus {
    /// Target answered with HTTP 200.
    Up,
    /// Target was unreachable or answered with any other status.
    Down,
}

/// Persistent identity of a validator node.
///
/// Created on the first verified signup for a never-before-seen public key
/// and recalled from storage on every reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    /// Stable identity, assigned by storage at creation.
    pub id: ValidatorId,
    /// Hex-encoded 32-byte Ed25519 public key. Unique per validator.
    pub public_key: String,
    /// Source address reported at first signup.
    pub ip: String,
    /// Coarse location label. `"unknown"` until an external geolocation
    /// collaborator fills it in.
    pub location: String,
    /// Accrued, not-yet-settled reward balance. Incremented by the hub,
    /// reset by the external settlement collaborator.
    pub pending_payouts: u64,
}

/// Payload for creating a [`Validator`] row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewValidator {
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    /// Source address of the signup connection.
    pub ip: String,
    /// Location label, `"unknown"` at signup time.
    pub location: String,
}

/// A URL the system periodically checks ("website" on the wire).
///
/// Read-only to the hub core; the management API owns its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredTarget {
    /// Stable identity.
    pub id: TargetId,
    /// The URL validators probe.
    pub url: String,
    /// Disabled targets are excluded from dispatch.
    pub disabled: bool,
}

/// One recorded check outcome for a target by a validator.
///
/// Immutable once created; written only by the reply reconciler after
/// signature verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Stable identity, assigned by storage at creation.
    pub id: ObservationId,
    /// Target that was checked.
    pub target_id: TargetId,
    /// Validator that performed the check (dispatch-time identity).
    pub validator_id: ValidatorId,
    /// Reported reachability.
    pub status: UptimeStatus,
    /// Reported round-trip latency in milliseconds.
    pub latency_ms: u64,
    /// Reconciliation time at the hub.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an [`Observation`] row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    /// Target that was checked.
    pub target_id: TargetId,
    /// Validator that performed the check.
    pub validator_id: ValidatorId,
    /// Reported reachability.
    pub status: UptimeStatus,
    /// Reported round-trip latency in milliseconds.
    pub latency_ms: u64,
    /// Reconciliation time at the hub.
    pub created_at: DateTime<Utc>,
}
