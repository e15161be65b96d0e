//! # Vigil Hub
//!
//! The coordination hub for the Vigil uptime-monitoring network. It owns the
//! validator WebSocket connections, authenticates every inbound frame with
//! Ed25519 detached signatures, fans monitoring work out to the fleet on a
//! fixed period, and reconciles verified replies into observations plus
//! pending payouts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         VIGIL HUB                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────────────────────────────┐        │
//! │  │           WebSocket Transport (adapters)         │        │
//! │  └───────────────┬──────────────────▲───────────────┘        │
//! │                  │ inbound frames   │ outbound frames        │
//! │  ┌───────────────▼──────────────────┴───────────────┐        │
//! │  │                   HubService                     │        │
//! │  │   Signup ──▶ verify ──▶ Validator Registry       │        │
//! │  │   Validate ─▶ Pending Probe Store ─▶ Reconciler  │        │
//! │  │   Scheduler ─▶ targets × validators fan-out      │        │
//! │  └───────────────────────┬──────────────────────────┘        │
//! │                          │                                   │
//! │  ┌───────────────────────▼──────────────────────────┐        │
//! │  │           StorageGateway (driven port)           │        │
//! │  └──────────────────────────────────────────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The crate follows a hexagonal layout:
//! - **Domain Layer:** registry, pending-probe store, configuration
//! - **Ports Layer:** trait definitions for storage and frame delivery
//! - **Service Layer:** protocol dispatch, scheduler, reconciler
//! - **Adapters Layer:** WebSocket transport, in-memory storage, test sinks

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Domain re-exports
pub use domain::config::{ConfigError, HubConfig};
pub use domain::pending::{PendingProbe, PendingProbeStore, ProbeStats};
pub use domain::registry::{ConnectionId, RegisteredValidator, ValidatorRegistry};
pub use domain::HubError;

// Port traits
pub use ports::outbound::{FrameSink, SinkError, StorageError, StorageGateway};

// Service
pub use service::HubService;

// Adapters
pub use adapters::memory::InMemoryStorage;
pub use adapters::testing::RecordingSink;
pub use adapters::ws::{serve, WsTransport};
