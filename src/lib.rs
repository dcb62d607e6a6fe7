//! Connectivity monitor library.
//!
//! Periodically probes a check URL, folds outcomes and platform network
//! events into an online/offline status, and notifies subscribers on change.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod platform;
pub mod probe;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod subscription;

pub use config::schema::MonitorConfig;
pub use lifecycle::Shutdown;
pub use monitor::{Monitor, MonitorError, StatusSnapshot};
pub use status::{ConnectivityStatus, ProbeOutcome};
pub use subscription::{StatusEvent, SubscriberId};
