//! Interface detection through `/sys/class/net`.
//!
//! # Responsibilities
//! - Report whether a non-loopback interface is operationally up
//! - Poll for changes and emit transition events
//!
//! # Design Decisions
//! - `unknown` operstate counts as up (tun/wireguard devices report it)
//! - A missing net root means we cannot tell, so the interface is assumed present

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::platform::{NetworkPlatform, PlatformEvent};

pub struct SysfsPlatform {
    net_root: PathBuf,
    last_seen: AtomicBool,
    tx: broadcast::Sender<PlatformEvent>,
}

impl SysfsPlatform {
    pub fn new(net_root: impl Into<PathBuf>) -> Self {
        let net_root = net_root.into();
        let (tx, _) = broadcast::channel(16);
        let present = scan_interfaces(&net_root);
        Self {
            net_root,
            last_seen: AtomicBool::new(present),
            tx,
        }
    }

    /// Poll the net root until shutdown, emitting an event on every transition.
    pub async fn run(
        self: Arc<Self>,
        poll_interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            net_root = %self.net_root.display(),
            poll_ms = poll_interval.as_millis() as u64,
            "Interface watcher starting"
        );

        let mut ticker = time::interval(poll_interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Interface watcher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Rescan and emit an event if the presence flag flipped. Returns the new flag.
    pub fn poll_once(&self) -> bool {
        let present = scan_interfaces(&self.net_root);
        let previous = self.last_seen.swap(present, Ordering::SeqCst);
        if previous != present {
            tracing::info!(online = present, "Network interface transition detected");
            let _ = self.tx.send(PlatformEvent::from_online(present));
        }
        present
    }
}

impl NetworkPlatform for SysfsPlatform {
    fn interface_present(&self) -> bool {
        scan_interfaces(&self.net_root)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.tx.subscribe()
    }
}

fn scan_interfaces(net_root: &Path) -> bool {
    let entries = match fs::read_dir(net_root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::trace!(
                net_root = %net_root.display(),
                error = %e,
                "Net root unreadable, assuming interface present"
            );
            return true;
        }
    };

    entries.flatten().any(|entry| {
        if entry.file_name() == "lo" {
            return false;
        }
        match fs::read_to_string(entry.path().join("operstate")) {
            Ok(state) => matches!(state.trim(), "up" | "unknown"),
            Err(_) => false,
        }
    })
}
