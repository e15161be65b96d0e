//! # Shared Types Crate
//!
//! Domain entities, identifiers, and wire frames shared between the hub and
//! the validator agent.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here.
//! - **Wire Fidelity**: the frame types in [`wire`] serialize to the exact
//!   JSON the validator fleet speaks; field names are part of the protocol
//!   and must not drift.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod ids;
pub mod wire;

pub use entities::{
    MonitoredTarget, NewObservation, NewValidator, Observation, UptimeStatus, Validator,
};
pub use ids::{CorrelationId, ObservationId, TargetId, ValidatorId};
pub use wire::{
    HubFrame, SignupAck, SignupRequest, ValidateReply, ValidateRequest, ValidatorFrame,
};
