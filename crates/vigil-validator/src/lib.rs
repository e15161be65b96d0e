//! # Vigil Validator
//!
//! The validator-side half of the wire contract: builds the signed signup
//! frame, answers dispatched validate requests with signed uptime
//! observations, and adopts the persistent identity the hub assigns.
//!
//! This crate deliberately owns no socket. The host process (or a test
//! harness) moves frames between a connection and [`ValidatorAgent`];
//! supervision and reconnection policy live there, not here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod errors;
pub mod probe;

pub use agent::ValidatorAgent;
pub use errors::AgentError;
pub use probe::{HttpProbe, ProbeOutcome, UptimeProbe, FAILED_PROBE_LATENCY_MS};
