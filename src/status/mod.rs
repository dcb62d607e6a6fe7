//! Connectivity status subsystem.
//!
//! # Data Flow
//! ```text
//! Probe outcome (Success / Failure / TimedOut)
//!     → tracker.rs (update error counter, derive status)
//!     → Transition { previous, status, changed }
//!     → changed == true → subscription registry fan-out
//!
//! Platform transition event (online / offline)
//!     → tracker.rs (force status, counter untouched)
//! ```
//!
//! # Design Decisions
//! - Change detection uses the boolean view (online vs offline)
//! - `OnlineUnconfirmed` is kept for diagnostics, never for debouncing
//! - Only a successful probe clears the error counter

pub mod tracker;
pub mod types;

pub use tracker::{SharedTracker, StatusTracker, TrackerSnapshot, Transition};
pub use types::{ConnectivityStatus, ProbeOutcome};
