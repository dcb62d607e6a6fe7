//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast to scheduler, runner refresh, interface watcher,
//!     admin server → each loop exits and releases its timers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → daemon calls Monitor::shutdown
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per monitor instance; every long-running task subscribes
//! - Triggering is idempotent and remembered, so late subscribers can check it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
