//! Platform network signals.
//!
//! # Responsibilities
//! - Answer "is there any network interface at all?" without network I/O
//! - Deliver connected/disconnected transition events
//!
//! # Design Decisions
//! - Events are fanned out on a broadcast channel; each consumer subscribes
//! - Implementations: sysfs polling (Linux daemon), manual (embedding host feeds events)

pub mod manual;
pub mod sysfs;

use tokio::sync::broadcast;

pub use manual::ManualPlatform;
pub use sysfs::SysfsPlatform;

/// Transition signal reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Online,
    Offline,
}

impl PlatformEvent {
    pub fn is_online(self) -> bool {
        matches!(self, PlatformEvent::Online)
    }

    pub fn from_online(online: bool) -> Self {
        if online {
            PlatformEvent::Online
        } else {
            PlatformEvent::Offline
        }
    }
}

/// Source of network-interface presence and transition events.
pub trait NetworkPlatform: Send + Sync {
    /// Whether at least one usable network interface exists.
    fn interface_present(&self) -> bool;

    /// Receive future transition events.
    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent>;
}
