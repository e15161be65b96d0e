//! Validator error types.

use thiserror::Error;

/// Errors raised while setting up the validator agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The HTTP probe client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
