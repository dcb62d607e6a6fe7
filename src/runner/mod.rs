//! Background runner subsystem.
//!
//! The background runner is the persistent, page-independent instance that
//! keeps the probing engine available. The platform owns the registration
//! mechanism; this module drives it.
//!
//! # Data Flow
//! ```text
//! Startup (lifecycle.rs):
//!     supported? → register(descriptor) → update() → wait for Active
//!     → scheduler may start
//!
//! Refresh (lifecycle.rs):
//!     every refresh interval → update() → errors logged, loop continues
//! ```
//!
//! # Design Decisions
//! - Fail fast: no support or failed activation aborts startup, there is
//!   no fallback to host-lifetime-only polling
//! - Activation wait is bounded so a stuck host cannot hang startup

pub mod host;
pub mod lifecycle;

use std::time::Duration;
use thiserror::Error;

pub use host::{BackgroundHost, LocalHost, RunnerDescriptor, RunnerState};
pub use lifecycle::RunnerLifecycle;

/// Registration or activation of the background runner failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackgroundRunnerError {
    /// The platform cannot host persistent background runners.
    #[error("background runners are not supported on this platform")]
    Unsupported,

    #[error("runner registration failed: {0}")]
    Registration(String),

    #[error("runner update failed: {0}")]
    Update(String),

    #[error("runner activation failed: {0}")]
    Activation(String),

    #[error("runner did not become active within {0:?}")]
    ActivationTimeout(Duration),
}
