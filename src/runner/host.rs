//! Background runner hosts.
//!
//! # Responsibilities
//! - Abstract the platform's register / update / activate primitives
//! - Provide the in-process host used by the daemon

use futures_util::future::BoxFuture;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::watch;

use crate::runner::BackgroundRunnerError;

/// What gets registered with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerDescriptor {
    pub name: String,
    pub version: String,
}

/// Registration state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Unregistered,
    Installing,
    Active,
}

/// Platform capability for persistent background runners.
pub trait BackgroundHost: Send + Sync {
    /// Whether the platform can host a background runner at all.
    fn is_supported(&self) -> bool;

    /// Register (or re-register) the runner.
    fn register<'a>(
        &'a self,
        descriptor: &'a RunnerDescriptor,
    ) -> BoxFuture<'a, Result<(), BackgroundRunnerError>>;

    /// Ask the host to bring the registration up to date.
    fn update(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>>;

    /// Resolve once the registered runner is active.
    fn wait_active(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>>;

    fn state(&self) -> RunnerState;
}

#[derive(Debug)]
struct Registration {
    descriptor: RunnerDescriptor,
    registered_at: Instant,
    updates: u64,
}

/// Host that keeps the runner inside the current process.
///
/// The daemon itself is the persistent runner, so activation completes on
/// the first update after registration.
#[derive(Debug)]
pub struct LocalHost {
    supported: bool,
    state: watch::Sender<RunnerState>,
    registration: Mutex<Option<Registration>>,
}

impl LocalHost {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunnerState::Unregistered);
        Self {
            supported: true,
            state,
            registration: Mutex::new(None),
        }
    }

    /// A host that reports no background runner support.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn descriptor(&self) -> Option<RunnerDescriptor> {
        self.lock().as_ref().map(|r| r.descriptor.clone())
    }

    /// Number of updates applied to the current registration.
    pub fn update_count(&self) -> u64 {
        self.lock().as_ref().map_or(0, |r| r.updates)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Registration>> {
        self.registration.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundHost for LocalHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn register<'a>(
        &'a self,
        descriptor: &'a RunnerDescriptor,
    ) -> BoxFuture<'a, Result<(), BackgroundRunnerError>> {
        Box::pin(async move {
            if !self.supported {
                return Err(BackgroundRunnerError::Unsupported);
            }
            if descriptor.name.trim().is_empty() || descriptor.version.trim().is_empty() {
                return Err(BackgroundRunnerError::Registration(
                    "runner name and version must not be empty".to_string(),
                ));
            }

            let mut registration = self.lock();
            if let Some(existing) = registration.as_ref() {
                if existing.descriptor == *descriptor {
                    tracing::debug!(
                        name = %descriptor.name,
                        version = %descriptor.version,
                        "Runner already registered"
                    );
                    return Ok(());
                }
                tracing::info!(
                    name = %descriptor.name,
                    old_version = %existing.descriptor.version,
                    new_version = %descriptor.version,
                    age_secs = existing.registered_at.elapsed().as_secs(),
                    "Replacing runner registration"
                );
            }

            *registration = Some(Registration {
                descriptor: descriptor.clone(),
                registered_at: Instant::now(),
                updates: 0,
            });
            self.state.send_replace(RunnerState::Installing);
            Ok(())
        })
    }

    fn update(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>> {
        Box::pin(async move {
            let mut registration = self.lock();
            let Some(current) = registration.as_mut() else {
                return Err(BackgroundRunnerError::Update("no runner registered".to_string()));
            };
            current.updates += 1;

            let active = *self.state.borrow() == RunnerState::Active;
            if !active {
                tracing::info!(
                    name = %current.descriptor.name,
                    version = %current.descriptor.version,
                    "Background runner activated"
                );
                self.state.send_replace(RunnerState::Active);
            }
            Ok(())
        })
    }

    fn wait_active(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>> {
        let mut rx = self.state.subscribe();
        Box::pin(async move {
            rx.wait_for(|state| *state == RunnerState::Active)
                .await
                .map(|_| ())
                .map_err(|e| BackgroundRunnerError::Activation(e.to_string()))
        })
    }

    fn state(&self) -> RunnerState {
        *self.state.borrow()
    }
}
