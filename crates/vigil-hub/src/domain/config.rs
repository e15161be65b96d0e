//! Hub configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// WebSocket listener configuration
    pub listen: ListenConfig,
    /// Dispatch scheduler configuration
    pub dispatch: DispatchConfig,
    /// Pending probe lifetime configuration
    pub probes: ProbeConfig,
    /// Payout accrual configuration
    pub payout: PayoutConfig,
    /// Target URLs seeded into storage at startup, standing in for the
    /// external management API.
    pub monitored_targets: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            dispatch: DispatchConfig::default(),
            probes: ProbeConfig::default(),
            payout: PayoutConfig::default(),
            monitored_targets: Vec::new(),
        }
    }
}

impl HubConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(
                "dispatch interval cannot be 0".into(),
            ));
        }

        if self.probes.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "probe timeout cannot be 0".into(),
            ));
        }

        if self.probes.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "sweep interval cannot be 0".into(),
            ));
        }

        if self.probes.max_inflight_per_validator == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_inflight_per_validator cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the WebSocket listener bind address
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen.host, self.listen.port)
    }
}

/// WebSocket listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8081,
        }
    }
}

/// Dispatch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Seconds between fan-out ticks
    pub interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl DispatchConfig {
    /// Tick period as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Pending probe lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Milliseconds a dispatched probe may stay unanswered. Sized to exceed
    /// a validator's expected round trip (target fetch plus signing).
    pub timeout_ms: u64,
    /// Milliseconds between expiry sweeps over the pending map
    pub sweep_interval_ms: u64,
    /// Maximum outstanding probes per validator; dispatches over the cap
    /// are dropped rather than queued
    pub max_inflight_per_validator: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            sweep_interval_ms: 5_000,
            max_inflight_per_validator: 8,
        }
    }
}

impl ProbeConfig {
    /// Probe timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Payout accrual configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutConfig {
    /// Reward credited to a validator per accepted observation
    pub reward_per_observation: u64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            reward_per_observation: 100,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scheduler interval is out of range
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// A timeout is out of range
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// A resource limit is out of range
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
