//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the connectivity monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Probe endpoint and cadence.
    pub check: CheckConfig,

    /// Background runner registration.
    pub runner: RunnerConfig,

    /// Platform interface detection.
    pub platform: PlatformConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only admin HTTP surface.
    pub admin: AdminConfig,
}

/// Probe and scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Endpoint probed for reachability.
    pub url: String,

    /// Interval between scheduled probes in milliseconds.
    pub interval_ms: u64,

    /// Deadline for the whole check; elapsing yields an unconfirmed online status.
    pub overall_timeout_ms: u64,

    /// Deadline for the fetch itself; elapsing counts as a failure.
    pub probe_timeout_ms: u64,

    /// Consecutive failures before scheduled probing pauses.
    pub max_consecutive_errors: u32,

    /// Pause length as a multiple of `interval_ms`.
    pub cooldown_multiplier: u32,
}

impl CheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        self.interval().saturating_mul(self.cooldown_multiplier)
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/favicon.ico".to_string(),
            interval_ms: 5000,
            overall_timeout_ms: 3000,
            probe_timeout_ms: 2000,
            max_consecutive_errors: 3,
            cooldown_multiplier: 5,
        }
    }
}

/// Background runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Registration name of the runner.
    pub name: String,

    /// Version registered; a new version replaces the old registration.
    pub version: String,

    /// How often the registration is refreshed, in milliseconds.
    pub refresh_interval_ms: u64,

    /// How long to wait for the runner to become active, in milliseconds.
    pub activation_timeout_ms: u64,
}

impl RunnerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn activation_timeout(&self) -> Duration {
        Duration::from_millis(self.activation_timeout_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name: "connectivity-runner".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            refresh_interval_ms: 60_000,
            activation_timeout_ms: 30_000,
        }
    }
}

/// Platform signal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Directory listing network interfaces.
    pub net_root: String,

    /// How often interfaces are rescanned for transitions, in milliseconds.
    pub poll_interval_ms: u64,
}

impl PlatformConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            net_root: "/sys/class/net".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Force debug-level logs for this crate.
    pub debug_logging: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin endpoints.
    pub enabled: bool,

    /// Admin bind address.
    pub bind_address: String,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl AdminConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8099".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}
