//! Subscriber registry and notification fan-out.
//!
//! # Data Flow
//! ```text
//! Tracker transition (changed == true)
//!     → StatusEvent::StatusChanged(status)
//!     → registry.rs snapshots current subscribers
//!     → each callback invoked in isolation (errors and panics caught)
//!     → DispatchReport { delivered, failed }
//! ```
//!
//! # Design Decisions
//! - Subscribers are keyed by `SubscriberId`; re-adding an id is a no-op
//! - The set is snapshotted before fan-out so callbacks may (un)subscribe re-entrantly
//! - A failing subscriber never stops delivery to the others

pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::status::ConnectivityStatus;

pub use registry::{Callback, DispatchReport, SubscriptionRegistry};

/// Error type callbacks may return.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Identity of a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum StatusEvent {
    /// Initial value on subscribe, and every subsequent change.
    StatusChanged(ConnectivityStatus),
}

impl StatusEvent {
    pub fn status(&self) -> ConnectivityStatus {
        match self {
            StatusEvent::StatusChanged(status) => *status,
        }
    }
}

/// A subscriber callback misbehaved during delivery.
#[derive(Debug, Error)]
pub enum SubscriberCallbackError {
    #[error("subscriber {id} returned an error: {source}")]
    Failed {
        id: SubscriberId,
        #[source]
        source: SubscriberError,
    },

    #[error("subscriber {id} panicked: {message}")]
    Panicked { id: SubscriberId, message: String },
}
