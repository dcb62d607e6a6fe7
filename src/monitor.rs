//! The monitor: single owning context for one connectivity detector.
//!
//! # Responsibilities
//! - Own the tracker, registry, prober, scheduler task and runner lifecycle
//! - Expose the host-facing API (subscribe, unsubscribe, check_once, shutdown)
//! - Enforce the lifecycle: create → start → stop (terminal)
//!
//! # Design Decisions
//! - No globals: every piece of state hangs off one `Monitor` value
//! - Startup is fail-fast on background runner errors; the scheduler never
//!   starts without an active runner
//! - Dropping a monitor triggers shutdown so spawned tasks cannot leak

use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::{validate_config, MonitorConfig, ValidationError};
use crate::lifecycle::Shutdown;
use crate::platform::NetworkPlatform;
use crate::probe::{Prober, Transport};
use crate::runner::{BackgroundHost, BackgroundRunnerError, RunnerLifecycle, RunnerState};
use crate::scheduler::{Scheduler, SchedulerPhase, SchedulerSettings};
use crate::status::tracker::{self, SharedTracker};
use crate::status::{ConnectivityStatus, StatusTracker};
use crate::subscription::registry::invoke;
use crate::subscription::{
    Callback, StatusEvent, SubscriberError, SubscriberId, SubscriptionRegistry,
};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid configuration: {0:?}")]
    InvalidConfig(Vec<ValidationError>),

    #[error("invalid check URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("monitor already started")]
    AlreadyStarted,

    #[error("monitor has been stopped")]
    Stopped,

    #[error(transparent)]
    Runner(#[from] BackgroundRunnerError),
}

/// Point-in-time view of the monitor, served by the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: Option<ConnectivityStatus>,
    pub online: Option<bool>,
    pub consecutive_errors: u32,
    pub phase: SchedulerPhase,
    pub runner: RunnerState,
    pub subscribers: usize,
    pub check_url: String,
}

enum MonitorState {
    Created(watch::Sender<SchedulerPhase>),
    Activating(watch::Sender<SchedulerPhase>),
    Started(Vec<JoinHandle<()>>),
    Stopped,
}

pub struct Monitor {
    prober: Arc<Prober>,
    platform: Arc<dyn NetworkPlatform>,
    tracker: SharedTracker,
    registry: Arc<SubscriptionRegistry>,
    runner: Arc<RunnerLifecycle>,
    settings: SchedulerSettings,
    shutdown: Shutdown,
    phase: watch::Receiver<SchedulerPhase>,
    state: tokio::sync::Mutex<MonitorState>,
}

impl Monitor {
    /// Create a monitor. Nothing runs until [`Monitor::start`].
    pub fn new(
        config: &MonitorConfig,
        transport: Arc<dyn Transport>,
        platform: Arc<dyn NetworkPlatform>,
        host: Arc<dyn BackgroundHost>,
    ) -> Result<Self, MonitorError> {
        validate_config(config).map_err(MonitorError::InvalidConfig)?;
        let check_url = Url::parse(&config.check.url)?;
        if config.check.probe_timeout_ms >= config.check.overall_timeout_ms {
            tracing::warn!(
                probe_timeout_ms = config.check.probe_timeout_ms,
                overall_timeout_ms = config.check.overall_timeout_ms,
                "Fetch timeout is not below the overall timeout, hung checks will report online"
            );
        }

        let prober = Arc::new(Prober::new(
            check_url,
            config.check.probe_timeout(),
            config.check.overall_timeout(),
            transport,
            platform.clone(),
        ));
        let (phase_tx, phase) = watch::channel(SchedulerPhase::Idle);

        Ok(Self {
            prober,
            platform,
            tracker: Arc::new(Mutex::new(StatusTracker::new())),
            registry: Arc::new(SubscriptionRegistry::new()),
            runner: Arc::new(RunnerLifecycle::new(host, &config.runner)),
            settings: SchedulerSettings::from(&config.check),
            shutdown: Shutdown::new(),
            phase,
            state: tokio::sync::Mutex::new(MonitorState::Created(phase_tx)),
        })
    }

    /// Activate the background runner, then start periodic checking.
    ///
    /// On runner failure the monitor stays un-started and no probing happens.
    /// The state lock is released while the runner activates, so a concurrent
    /// [`Monitor::stop`] cancels a pending start instead of waiting for it.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let mut shutdown = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, MonitorState::Stopped) {
                MonitorState::Created(phase_tx) => *state = MonitorState::Activating(phase_tx),
                other => {
                    let err = match other {
                        MonitorState::Stopped => MonitorError::Stopped,
                        _ => MonitorError::AlreadyStarted,
                    };
                    *state = other;
                    return Err(err);
                }
            }
            self.shutdown.subscribe()
        };

        let activated = tokio::select! {
            result = self.runner.activate() => result.map_err(MonitorError::from),
            _ = shutdown.recv() => Err(MonitorError::Stopped),
        };

        let mut state = self.state.lock().await;
        let phase_tx = match std::mem::replace(&mut *state, MonitorState::Stopped) {
            MonitorState::Activating(phase_tx) => phase_tx,
            other => {
                // Stopped while activating.
                *state = other;
                return Err(MonitorError::Stopped);
            }
        };
        if let Err(e) = activated {
            tracing::error!(error = %e, "Background runner activation failed");
            *state = MonitorState::Created(phase_tx);
            return Err(e);
        }

        let refresh = tokio::spawn(self.runner.clone().run_refresh(self.shutdown.subscribe()));
        let scheduler = Scheduler::new(
            self.settings,
            self.prober.clone(),
            self.tracker.clone(),
            self.registry.clone(),
            phase_tx,
        );
        let probing = tokio::spawn(
            scheduler.run(self.platform.subscribe(), self.shutdown.subscribe()),
        );

        *state = MonitorState::Started(vec![refresh, probing]);
        tracing::info!(
            url = %self.prober.check_url(),
            runner = %self.runner.descriptor().name,
            "Connectivity monitor started"
        );
        Ok(())
    }

    /// Stop all timers and tasks. Terminal: the monitor cannot be restarted.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, MonitorState::Stopped) {
            MonitorState::Started(tasks) => {
                self.shutdown.trigger();
                for task in tasks {
                    if let Err(e) = task.await {
                        tracing::warn!(error = %e, "Monitor task ended abnormally");
                    }
                }
                tracing::info!("Connectivity monitor stopped");
            }
            MonitorState::Created(phase_tx) | MonitorState::Activating(phase_tx) => {
                self.shutdown.trigger();
                phase_tx.send_replace(SchedulerPhase::Stopped);
            }
            MonitorState::Stopped => {}
        }
    }

    /// Stop the monitor and drop every subscriber.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.registry.clear();
    }

    /// Shut down and consume the monitor.
    pub async fn dispose(self) {
        self.shutdown().await;
    }

    /// Probe now and return the status. Does not touch the tracker or notify.
    pub async fn check_once(&self) -> ConnectivityStatus {
        self.prober.probe().await.status()
    }

    /// Register a callback under a fresh id. See [`Monitor::subscribe_as`].
    pub async fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&StatusEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.subscribe_as(id, callback).await;
        id
    }

    /// Register a callback under `id` and invoke it once with a freshly probed status.
    ///
    /// Returns false if `id` was already registered; the existing callback is
    /// kept and the initial invocation goes to the callback passed here.
    /// After [`Monitor::stop`] nothing is registered or invoked.
    pub async fn subscribe_as<F>(&self, id: SubscriberId, callback: F) -> bool
    where
        F: Fn(&StatusEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let added = {
            let state = self.state.lock().await;
            if matches!(*state, MonitorState::Stopped) {
                tracing::debug!(subscriber = %id, "Monitor stopped, subscription ignored");
                return false;
            }
            self.registry.insert(id, callback.clone())
        };

        let status = self.check_once().await;
        if let Err(e) = invoke(id, &callback, &StatusEvent::StatusChanged(status)) {
            tracing::warn!(error = %e, "Initial subscriber callback failed");
        }
        added
    }

    /// Remove a subscriber. No-op if absent.
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        self.registry.remove(id)
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.borrow()
    }

    pub fn last_known(&self) -> Option<ConnectivityStatus> {
        tracker::lock(&self.tracker).last_known()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let tracked = tracker::lock(&self.tracker).snapshot();
        StatusSnapshot {
            status: tracked.last_known,
            online: tracked.last_known.map(ConnectivityStatus::is_online),
            consecutive_errors: tracked.consecutive_errors,
            phase: self.phase(),
            runner: self.runner.state(),
            subscribers: self.registry.len(),
            check_url: self.prober.check_url().to_string(),
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualPlatform;
    use crate::probe::ProbeError;
    use crate::runner::LocalHost;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time;

    /// Transport whose answer can be flipped at runtime.
    #[derive(Default)]
    struct SwitchTransport {
        fail: AtomicBool,
        hang: AtomicBool,
        calls: AtomicUsize,
    }

    impl Transport for SwitchTransport {
        fn fetch<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<(), ProbeError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang.load(Ordering::SeqCst) {
                return Box::pin(futures_util::future::pending());
            }
            let fail = self.fail.load(Ordering::SeqCst);
            Box::pin(async move {
                if fail {
                    Err(ProbeError::Status(500))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Host that accepts registration but never reports the runner active.
    struct StuckHost;

    impl BackgroundHost for StuckHost {
        fn is_supported(&self) -> bool {
            true
        }
        fn register<'a>(
            &'a self,
            _: &'a crate::runner::RunnerDescriptor,
        ) -> BoxFuture<'a, Result<(), BackgroundRunnerError>> {
            Box::pin(async { Ok(()) })
        }
        fn update(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>> {
            Box::pin(async { Ok(()) })
        }
        fn wait_active(&self) -> BoxFuture<'_, Result<(), BackgroundRunnerError>> {
            Box::pin(futures_util::future::pending())
        }
        fn state(&self) -> RunnerState {
            RunnerState::Installing
        }
    }

    fn monitor_with(
        transport: Arc<SwitchTransport>,
        host: LocalHost,
    ) -> (Monitor, Arc<ManualPlatform>) {
        let platform = Arc::new(ManualPlatform::new(true));
        let config = MonitorConfig::default();
        let monitor = Monitor::new(&config, transport, platform.clone(), Arc::new(host)).unwrap();
        (monitor, platform)
    }

    fn recorder() -> (
        Arc<Mutex<Vec<ConnectivityStatus>>>,
        impl Fn(&StatusEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        (seen, move |event: &StatusEvent| -> Result<(), SubscriberError> {
            log.lock().unwrap().push(event.status());
            Ok(())
        })
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = MonitorConfig::default();
        config.check.url = "mailto:someone".to_string();
        let result = Monitor::new(
            &config,
            Arc::new(SwitchTransport::default()),
            Arc::new(ManualPlatform::default()),
            Arc::new(LocalHost::new()),
        );
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_runner_blocks_start() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport.clone(), LocalHost::unsupported());

        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::Runner(BackgroundRunnerError::Unsupported)));
        assert_eq!(monitor.phase(), SchedulerPhase::Idle);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_start_stop_is_terminal() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport.clone(), LocalHost::new());

        monitor.start().await.unwrap();
        assert!(matches!(monitor.start().await, Err(MonitorError::AlreadyStarted)));

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.phase(), SchedulerPhase::Running);
        assert_eq!(monitor.last_known(), Some(ConnectivityStatus::Online));
        assert_eq!(monitor.snapshot().runner, RunnerState::Active);

        monitor.stop().await;
        assert_eq!(monitor.phase(), SchedulerPhase::Stopped);
        assert!(matches!(monitor.start().await, Err(MonitorError::Stopped)));

        let calls = transport.calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_gets_fresh_initial_value() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport.clone(), LocalHost::new());
        monitor.start().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.last_known(), Some(ConnectivityStatus::Online));

        // Cached status is Online, but the fresh probe says otherwise.
        transport.fail.store(true, Ordering::SeqCst);
        let calls_before = transport.calls.load(Ordering::SeqCst);
        let (seen, callback) = recorder();
        monitor.subscribe(callback).await;

        assert_eq!(*seen.lock().unwrap(), vec![ConnectivityStatus::Offline]);
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls_before + 1);
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_subscribe_as() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport, LocalHost::new());
        let id = SubscriberId::new();

        let (first, callback) = recorder();
        assert!(monitor.subscribe_as(id, callback).await);
        let (second, callback) = recorder();
        assert!(!monitor.subscribe_as(id, callback).await);

        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 1);
        assert_eq!(monitor.snapshot().subscribers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribed_callback_is_not_invoked() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, platform) = monitor_with(transport, LocalHost::new());
        monitor.start().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;

        let (kept, callback) = recorder();
        monitor.subscribe(callback).await;
        let (removed, callback) = recorder();
        let id = monitor.subscribe(callback).await;
        assert!(monitor.unsubscribe(&id));
        assert!(!monitor.unsubscribe(&id));

        platform.set_online(false);
        time::sleep(Duration::from_millis(100)).await;

        assert_eq!(
            *kept.lock().unwrap(),
            vec![ConnectivityStatus::Online, ConnectivityStatus::Offline]
        );
        assert_eq!(*removed.lock().unwrap(), vec![ConnectivityStatus::Online]);
        monitor.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_once_does_not_notify() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport.clone(), LocalHost::new());
        let (seen, callback) = recorder();
        monitor.subscribe(callback).await;

        transport.fail.store(true, Ordering::SeqCst);
        assert_eq!(monitor.check_once().await, ConnectivityStatus::Offline);
        assert_eq!(monitor.last_known(), None);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_clears_subscribers() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport, LocalHost::new());
        monitor.start().await.unwrap();
        let (_seen, callback) = recorder();
        monitor.subscribe(callback).await;
        assert_eq!(monitor.snapshot().subscribers, 1);

        monitor.shutdown().await;
        assert_eq!(monitor.snapshot().subscribers, 0);
        assert_eq!(monitor.phase(), SchedulerPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_check_past_overall_timeout_is_unconfirmed() {
        let mut config = MonitorConfig::default();
        config.check.probe_timeout_ms = 5_000;
        config.check.overall_timeout_ms = 3_000;
        let transport = Arc::new(SwitchTransport::default());
        let platform = Arc::new(ManualPlatform::new(true));
        let monitor =
            Monitor::new(&config, transport.clone(), platform, Arc::new(LocalHost::new())).unwrap();

        transport.hang.store(true, Ordering::SeqCst);
        assert_eq!(monitor.check_once().await, ConnectivityStatus::OnlineUnconfirmed);

        // First tick fails, then checks start hanging.
        transport.hang.store(false, Ordering::SeqCst);
        transport.fail.store(true, Ordering::SeqCst);
        monitor.start().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(monitor.last_known(), Some(ConnectivityStatus::Offline));
        assert_eq!(monitor.snapshot().consecutive_errors, 1);

        transport.hang.store(true, Ordering::SeqCst);
        // The next tick hangs until the overall timeout.
        time::sleep(Duration::from_millis(8_000)).await;
        assert_eq!(monitor.last_known(), Some(ConnectivityStatus::OnlineUnconfirmed));
        assert_eq!(monitor.snapshot().consecutive_errors, 1);
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_activation() {
        let platform = Arc::new(ManualPlatform::new(true));
        let transport = Arc::new(SwitchTransport::default());
        let config = MonitorConfig::default();
        let monitor = Arc::new(
            Monitor::new(&config, transport.clone(), platform, Arc::new(StuckHost)).unwrap(),
        );

        let starting = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.start().await }
        });
        time::sleep(Duration::from_secs(1)).await;

        let before = time::Instant::now();
        monitor.stop().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(monitor.phase(), SchedulerPhase::Stopped);

        assert!(matches!(starting.await.unwrap(), Err(MonitorError::Stopped)));
        assert!(matches!(monitor.start().await, Err(MonitorError::Stopped)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_can_retry_after_activation_timeout() {
        let mut config = MonitorConfig::default();
        config.runner.activation_timeout_ms = 1_000;
        let monitor = Monitor::new(
            &config,
            Arc::new(SwitchTransport::default()),
            Arc::new(ManualPlatform::new(true)),
            Arc::new(StuckHost),
        )
        .unwrap();

        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::Runner(BackgroundRunnerError::ActivationTimeout(_))));
        assert_eq!(monitor.phase(), SchedulerPhase::Idle);
        assert!(matches!(monitor.start().await, Err(MonitorError::Runner(_))));
    }

    #[tokio::test]
    async fn test_subscribe_after_shutdown_is_ignored() {
        let transport = Arc::new(SwitchTransport::default());
        let (monitor, _platform) = monitor_with(transport.clone(), LocalHost::new());
        monitor.start().await.unwrap();
        monitor.shutdown().await;
        let calls = transport.calls.load(Ordering::SeqCst);

        let (seen, callback) = recorder();
        assert!(!monitor.subscribe_as(SubscriberId::new(), callback).await);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(monitor.snapshot().subscribers, 0);
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls);
    }
}
