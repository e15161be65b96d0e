//! Ports layer: trait definitions for external dependencies.

pub mod outbound;

pub use outbound::{FrameSink, SinkError, StorageError, StorageGateway};
