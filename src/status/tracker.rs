//! Status tracker state machine.
//!
//! # Responsibilities
//! - Hold the last known status and the consecutive error counter
//! - Derive a status from each probe outcome or platform event
//! - Decide whether the derived status is a change worth announcing
//!
//! # State Transitions
//! ```text
//! Success  → Online,            errors = 0
//! Failure  → Offline,           errors += 1
//! TimedOut → OnlineUnconfirmed, errors unchanged
//! Platform offline → Offline,   errors unchanged
//! Platform online  → Online,    errors unchanged
//! ```

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::status::types::{ConnectivityStatus, ProbeOutcome};

/// Tracker shared between the scheduler and the monitor handle.
pub type SharedTracker = Arc<Mutex<StatusTracker>>;

/// Lock a shared tracker. Never hold the guard across an await.
pub fn lock(tracker: &Mutex<StatusTracker>) -> MutexGuard<'_, StatusTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of feeding one observation into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Last known status before this observation.
    pub previous: Option<ConnectivityStatus>,
    /// Status derived from this observation.
    pub status: ConnectivityStatus,
    /// True when subscribers must be told.
    pub changed: bool,
}

/// Point-in-time copy of the tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerSnapshot {
    pub last_known: Option<ConnectivityStatus>,
    pub consecutive_errors: u32,
}

#[derive(Debug, Default)]
pub struct StatusTracker {
    last_known: Option<ConnectivityStatus>,
    consecutive_errors: u32,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a probe outcome.
    pub fn record_outcome(&mut self, outcome: ProbeOutcome) -> Transition {
        match outcome {
            ProbeOutcome::Success => self.consecutive_errors = 0,
            ProbeOutcome::Failure => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
            }
            ProbeOutcome::TimedOut => {}
        }
        self.apply(outcome.status())
    }

    /// Apply a platform transition signal. Never touches the error counter.
    pub fn record_platform_event(&mut self, is_online: bool) -> Transition {
        self.apply(ConnectivityStatus::from_online(is_online))
    }

    pub fn last_known(&self) -> Option<ConnectivityStatus> {
        self.last_known
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            last_known: self.last_known,
            consecutive_errors: self.consecutive_errors,
        }
    }

    fn apply(&mut self, status: ConnectivityStatus) -> Transition {
        let previous = self.last_known;
        let changed = previous.map(ConnectivityStatus::is_online) != Some(status.is_online());

        if changed {
            tracing::debug!(
                previous = ?previous,
                status = %status,
                consecutive_errors = self.consecutive_errors,
                "Connectivity status changed"
            );
        } else if previous != Some(status) {
            // Same boolean view, different flavour (e.g. Online → OnlineUnconfirmed).
            tracing::trace!(
                previous = ?previous,
                status = %status,
                "Status refined without change"
            );
        }

        // Recorded before any fan-out happens.
        self.last_known = Some(status);

        Transition {
            previous,
            status,
            changed,
        }
    }
}
