//! Hub error types.

use crate::domain::config::ConfigError;
use thiserror::Error;

/// Top-level hub errors.
///
/// Per-frame failures (bad signatures, correlation misses, storage outages
/// during reconciliation) are not represented here: they are logged and
/// swallowed at the handler boundary, since the hub stays up through all of
/// them. `HubError` covers the failures that prevent the hub from serving.
#[derive(Debug, Error)]
pub enum HubError {
    /// Configuration rejected at startup
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listener or WebSocket server failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Socket-level I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
