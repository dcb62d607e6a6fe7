//! Status and probe outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connectivity as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    /// Probe failed or the platform reported the network down.
    Offline,
    /// Probe succeeded or the platform reported the network up.
    Online,
    /// The overall check timed out; assumed online but not proven.
    OnlineUnconfirmed,
}

impl ConnectivityStatus {
    /// Boolean view used for change detection.
    pub fn is_online(self) -> bool {
        !matches!(self, ConnectivityStatus::Offline)
    }

    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectivityStatus::Online
        } else {
            ConnectivityStatus::Offline
        }
    }

    /// Numeric value for the status gauge (0 offline, 1 online, 2 unconfirmed).
    pub fn as_gauge(self) -> f64 {
        match self {
            ConnectivityStatus::Offline => 0.0,
            ConnectivityStatus::Online => 1.0,
            ConnectivityStatus::OnlineUnconfirmed => 2.0,
        }
    }
}

impl From<ConnectivityStatus> for bool {
    fn from(status: ConnectivityStatus) -> Self {
        status.is_online()
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityStatus::Offline => "offline",
            ConnectivityStatus::Online => "online",
            ConnectivityStatus::OnlineUnconfirmed => "online_unconfirmed",
        };
        f.write_str(s)
    }
}

/// Result of a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    Success,
    Failure,
    /// The overall check deadline elapsed before the fetch resolved.
    TimedOut,
}

impl ProbeOutcome {
    /// Status this outcome maps to.
    pub fn status(self) -> ConnectivityStatus {
        match self {
            ProbeOutcome::Success => ConnectivityStatus::Online,
            ProbeOutcome::Failure => ConnectivityStatus::Offline,
            ProbeOutcome::TimedOut => ConnectivityStatus::OnlineUnconfirmed,
        }
    }

    /// Label used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeOutcome::Success => "success",
            ProbeOutcome::Failure => "failure",
            ProbeOutcome::TimedOut => "timed_out",
        }
    }
}
