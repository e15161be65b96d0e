//! Uptime probing port and its HTTP adapter.

use crate::errors::AgentError;
use async_trait::async_trait;
use shared_types::UptimeStatus;
use std::time::{Duration, Instant};
use tracing::debug;

/// Latency reported when a check fails before any HTTP status is available
/// (connection refused, DNS failure, timeout).
pub const FAILED_PROBE_LATENCY_MS: u64 = 1_000;

/// Outcome of one uptime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Reachability verdict.
    pub status: UptimeStatus,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u64,
}

/// Abstract interface for checking one URL.
///
/// The agent is generic over this so tests can script outcomes without a
/// network.
#[async_trait]
pub trait UptimeProbe: Send + Sync {
    /// Check `url` and report reachability plus wall-clock latency.
    async fn check(&self, url: &str) -> ProbeOutcome;
}

/// [`UptimeProbe`] over a real HTTP client.
///
/// HTTP 200 is `UP`; any other status is `DOWN`. Transport-level failures
/// are `DOWN` with [`FAILED_PROBE_LATENCY_MS`].
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Build a probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UptimeProbe for HttpProbe {
    async fn check(&self, url: &str) -> ProbeOutcome {
        let started = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let status = if response.status() == reqwest::StatusCode::OK {
                    UptimeStatus::Up
                } else {
                    UptimeStatus::Down
                };
                ProbeOutcome { status, latency_ms }
            }
            Err(err) => {
                debug!(url, error = %err, "Probe request failed");
                ProbeOutcome {
                    status: UptimeStatus::Down,
                    latency_ms: FAILED_PROBE_LATENCY_MS,
                }
            }
        }
    }
}
