//! Probe scheduling with error backoff.
//!
//! # States
//! - Idle: created, not started
//! - Running: probing on a fixed interval
//! - Paused: too many consecutive errors, waiting for the cooldown
//! - Stopped: shut down, terminal
//!
//! # State Transitions
//! ```text
//! Idle → Running: run()
//! Running → Paused: tick while consecutive_errors >= max_consecutive_errors
//! Paused → Running: cooldown elapsed (probe immediately, restart interval)
//! * → Stopped: shutdown signal
//! ```
//!
//! # Design Decisions
//! - Single-flight: a tick arriving while a probe is pending is skipped
//! - Probes run as tasks; a panicking probe counts as a failure
//! - Platform events are applied in every state, immediately, even while a
//!   probe is in flight (its outcome still lands afterwards)

use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, MissedTickBehavior, Sleep};

use crate::config::CheckConfig;
use crate::observability::metrics;
use crate::platform::PlatformEvent;
use crate::probe::Prober;
use crate::status::tracker::{self, SharedTracker};
use crate::status::{ProbeOutcome, Transition};
use crate::subscription::{StatusEvent, SubscriptionRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub cooldown: Duration,
    pub max_consecutive_errors: u32,
}

impl From<&CheckConfig> for SchedulerSettings {
    fn from(config: &CheckConfig) -> Self {
        Self {
            interval: config.interval(),
            cooldown: config.cooldown(),
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }
}

pub struct Scheduler {
    settings: SchedulerSettings,
    prober: Arc<Prober>,
    tracker: SharedTracker,
    registry: Arc<SubscriptionRegistry>,
    phase: watch::Sender<SchedulerPhase>,
}

impl Scheduler {
    pub fn new(
        settings: SchedulerSettings,
        prober: Arc<Prober>,
        tracker: SharedTracker,
        registry: Arc<SubscriptionRegistry>,
        phase: watch::Sender<SchedulerPhase>,
    ) -> Self {
        Self {
            settings,
            prober,
            tracker,
            registry,
            phase,
        }
    }

    /// Drive probing until shutdown.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<PlatformEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            url = %self.prober.check_url(),
            interval_ms = self.settings.interval.as_millis() as u64,
            cooldown_ms = self.settings.cooldown.as_millis() as u64,
            max_consecutive_errors = self.settings.max_consecutive_errors,
            "Scheduler starting"
        );
        self.set_phase(SchedulerPhase::Running);

        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cooldown: Option<Pin<Box<Sleep>>> = None;
        let mut in_flight: Option<JoinHandle<ProbeOutcome>> = None;
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Scheduler received shutdown signal, exiting loop");
                    break;
                }
                event = events.recv(), if events_open => match event {
                    Ok(event) => self.apply_platform_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Platform events lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Platform event channel closed");
                        events_open = false;
                    }
                },
                _ = ticker.tick(), if cooldown.is_none() => {
                    if in_flight.is_some() {
                        tracing::debug!("Previous probe still in flight, skipping tick");
                    } else if self.consecutive_errors() >= self.settings.max_consecutive_errors {
                        tracing::info!(
                            consecutive_errors = self.consecutive_errors(),
                            cooldown_ms = self.settings.cooldown.as_millis() as u64,
                            "Too many consecutive errors, pausing checks"
                        );
                        metrics::record_pause();
                        cooldown = Some(Box::pin(time::sleep(self.settings.cooldown)));
                        self.set_phase(SchedulerPhase::Paused);
                    } else {
                        in_flight = Some(self.launch_probe());
                    }
                }
                () = wait_cooldown(&mut cooldown), if cooldown.is_some() => {
                    cooldown = None;
                    tracing::info!("Cooldown elapsed, resuming checks");
                    self.set_phase(SchedulerPhase::Running);
                    ticker.reset();
                    if in_flight.is_none() {
                        in_flight = Some(self.launch_probe());
                    }
                }
                joined = wait_probe(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!(error = %e, "Probe task failed, counting as failure");
                            ProbeOutcome::Failure
                        }
                    };
                    self.apply_outcome(outcome);
                }
            }
        }

        if let Some(task) = in_flight.take() {
            task.abort();
        }
        self.set_phase(SchedulerPhase::Stopped);
    }

    fn launch_probe(&self) -> JoinHandle<ProbeOutcome> {
        let prober = self.prober.clone();
        tokio::spawn(async move { prober.probe().await })
    }

    fn consecutive_errors(&self) -> u32 {
        tracker::lock(&self.tracker).consecutive_errors()
    }

    fn apply_outcome(&self, outcome: ProbeOutcome) {
        let (transition, errors) = {
            let mut tracker = tracker::lock(&self.tracker);
            let transition = tracker.record_outcome(outcome);
            (transition, tracker.consecutive_errors())
        };
        tracing::debug!(
            outcome = outcome.as_str(),
            status = %transition.status,
            consecutive_errors = errors,
            "Probe completed"
        );
        publish(&self.registry, transition, errors);
    }

    fn apply_platform_event(&self, event: PlatformEvent) {
        let (transition, errors) = {
            let mut tracker = tracker::lock(&self.tracker);
            let transition = tracker.record_platform_event(event.is_online());
            (transition, tracker.consecutive_errors())
        };
        tracing::debug!(event = ?event, status = %transition.status, "Platform event applied");
        publish(&self.registry, transition, errors);
    }

    fn set_phase(&self, phase: SchedulerPhase) {
        self.phase.send_replace(phase);
    }
}

/// Record a transition and fan out if it is a change.
pub(crate) fn publish(
    registry: &SubscriptionRegistry,
    transition: Transition,
    consecutive_errors: u32,
) {
    metrics::record_status(transition.status, consecutive_errors);
    if transition.changed {
        tracing::info!(
            previous = ?transition.previous,
            status = %transition.status,
            subscribers = registry.len(),
            "Connectivity changed"
        );
        registry.notify(&StatusEvent::StatusChanged(transition.status));
    }
}

async fn wait_cooldown(cooldown: &mut Option<Pin<Box<Sleep>>>) {
    match cooldown {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

async fn wait_probe(
    task: &mut Option<JoinHandle<ProbeOutcome>>,
) -> Result<ProbeOutcome, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
