//! Connectivity probing subsystem.
//!
//! # Data Flow
//! ```text
//! Prober::probe()
//!     → platform says no interface? → Failure (no I/O)
//!     → cache-busted URL
//!     → outer timeout ┬─ fetch timeout ─ Transport::fetch()
//!                     │     ok → Success, error / elapsed → Failure
//!                     └─ elapsed → TimedOut
//! ```
//!
//! # Design Decisions
//! - The probe never fails; every error is logged and folded into an outcome
//! - Two nested deadlines: the inner one is a definitive failure, the outer
//!   one is treated optimistically as online
//! - Transport is a trait so the HTTP client can be swapped in tests

pub mod prober;
pub mod transport;

use std::time::Duration;
use thiserror::Error;

pub use prober::Prober;
pub use transport::{HttpTransport, Transport};

/// Reasons a single fetch did not succeed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The platform reports no network interface.
    #[error("no network interface available")]
    NoInterface,

    /// Connection or protocol error.
    #[error("request failed: {0}")]
    Request(String),

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The fetch-level deadline elapsed.
    #[error("fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// The HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Client(String),
}
