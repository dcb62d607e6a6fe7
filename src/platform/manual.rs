//! Platform driven by the embedding application.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::platform::{NetworkPlatform, PlatformEvent};

/// A platform whose state is pushed in from outside (UI shell, tests, FFI).
#[derive(Debug)]
pub struct ManualPlatform {
    online: AtomicBool,
    tx: broadcast::Sender<PlatformEvent>,
}

impl ManualPlatform {
    pub fn new(online: bool) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(online),
            tx,
        }
    }

    /// Record the new interface state and emit a transition event.
    ///
    /// The event is emitted even if the state did not change; the tracker
    /// debounces duplicates.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        tracing::info!(online, "Network status changed");
        // No receivers is fine: nobody is listening yet.
        let _ = self.tx.send(PlatformEvent::from_online(online));
    }
}

impl Default for ManualPlatform {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkPlatform for ManualPlatform {
    fn interface_present(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.tx.subscribe()
    }
}
