//! Background runner activation and refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RunnerConfig;
use crate::runner::{BackgroundHost, BackgroundRunnerError, RunnerDescriptor, RunnerState};

pub struct RunnerLifecycle {
    host: Arc<dyn BackgroundHost>,
    descriptor: RunnerDescriptor,
    refresh_interval: Duration,
    activation_timeout: Duration,
}

impl RunnerLifecycle {
    pub fn new(host: Arc<dyn BackgroundHost>, config: &RunnerConfig) -> Self {
        Self {
            host,
            descriptor: RunnerDescriptor {
                name: config.name.clone(),
                version: config.version.clone(),
            },
            refresh_interval: config.refresh_interval(),
            activation_timeout: config.activation_timeout(),
        }
    }

    pub fn descriptor(&self) -> &RunnerDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> RunnerState {
        self.host.state()
    }

    /// Register, update and wait for the runner to become active.
    pub async fn activate(&self) -> Result<(), BackgroundRunnerError> {
        if !self.host.is_supported() {
            tracing::error!("Background runners unsupported, periodic checking will not start");
            return Err(BackgroundRunnerError::Unsupported);
        }

        self.host.register(&self.descriptor).await?;
        self.host.update().await?;

        match time::timeout(self.activation_timeout, self.host.wait_active()).await {
            Ok(result) => result?,
            Err(_) => return Err(BackgroundRunnerError::ActivationTimeout(self.activation_timeout)),
        }

        tracing::info!(
            name = %self.descriptor.name,
            version = %self.descriptor.version,
            "Background runner ready"
        );
        Ok(())
    }

    /// Periodically ask the host to refresh the registration until shutdown.
    pub async fn run_refresh(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let start = time::Instant::now() + self.refresh_interval;
        let mut ticker = time::interval_at(start, self.refresh_interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.host.update().await {
                        Ok(()) => tracing::debug!(
                            name = %self.descriptor.name,
                            "Runner registration refreshed"
                        ),
                        Err(e) => tracing::warn!(
                            name = %self.descriptor.name,
                            error = %e,
                            "Runner refresh failed"
                        ),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Runner refresh received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
