//! Single connectivity check.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;
use url::Url;

use crate::observability::metrics;
use crate::platform::NetworkPlatform;
use crate::probe::{ProbeError, Transport};
use crate::status::ProbeOutcome;

/// Query parameter carrying the cache-busting token.
pub const CACHE_BUST_PARAM: &str = "cb";

pub struct Prober {
    check_url: Url,
    probe_timeout: Duration,
    overall_timeout: Duration,
    transport: Arc<dyn Transport>,
    platform: Arc<dyn NetworkPlatform>,
}

impl Prober {
    pub fn new(
        check_url: Url,
        probe_timeout: Duration,
        overall_timeout: Duration,
        transport: Arc<dyn Transport>,
        platform: Arc<dyn NetworkPlatform>,
    ) -> Self {
        Self {
            check_url,
            probe_timeout,
            overall_timeout,
            transport,
            platform,
        }
    }

    pub fn check_url(&self) -> &Url {
        &self.check_url
    }

    /// Run one check. Always resolves within the overall timeout.
    pub async fn probe(&self) -> ProbeOutcome {
        let outcome = match time::timeout(self.overall_timeout, self.fetch_bounded()).await {
            Ok(Ok(())) => ProbeOutcome::Success,
            Ok(Err(e)) => {
                tracing::debug!(url = %self.check_url, error = %e, "Connectivity probe failed");
                ProbeOutcome::Failure
            }
            Err(_) => {
                tracing::debug!(
                    url = %self.check_url,
                    timeout_ms = self.overall_timeout.as_millis() as u64,
                    "Connectivity probe hit overall timeout, assuming online"
                );
                ProbeOutcome::TimedOut
            }
        };

        metrics::record_probe(outcome);
        outcome
    }

    async fn fetch_bounded(&self) -> Result<(), ProbeError> {
        if !self.platform.interface_present() {
            return Err(ProbeError::NoInterface);
        }

        let url = cache_busted(&self.check_url);
        match time::timeout(self.probe_timeout, self.transport.fetch(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::FetchTimeout(self.probe_timeout)),
        }
    }
}

/// Append a unique token so intermediaries cannot serve a cached answer.
pub fn cache_busted(url: &Url) -> Url {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let token = format!("{}-{}", millis, fastrand::u32(..));

    let mut busted = url.clone();
    busted.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &token);
    busted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualPlatform;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that sleeps, then answers with a fixed result.
    struct ScriptedTransport {
        delay: Duration,
        fail: bool,
        calls: AtomicUsize,
        seen: Mutex<Vec<Url>>,
    }

    impl ScriptedTransport {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                delay,
                fail,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<(), ProbeError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.seen.lock().unwrap().push(url.clone());
                time::sleep(self.delay).await;
                if self.fail {
                    Err(ProbeError::Status(503))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn prober(
        transport: Arc<ScriptedTransport>,
        platform: Arc<ManualPlatform>,
        probe_ms: u64,
        overall_ms: u64,
    ) -> Prober {
        Prober::new(
            Url::parse("http://127.0.0.1:9/favicon.ico").unwrap(),
            Duration::from_millis(probe_ms),
            Duration::from_millis(overall_ms),
            transport,
            platform,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success() {
        let transport = ScriptedTransport::new(Duration::from_millis(10), false);
        let p = prober(transport.clone(), Arc::new(ManualPlatform::new(true)), 2000, 3000);
        assert_eq!(p.probe().await, ProbeOutcome::Success);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoint_error_is_failure() {
        let transport = ScriptedTransport::new(Duration::from_millis(10), true);
        let p = prober(transport, Arc::new(ManualPlatform::new(true)), 2000, 3000);
        assert_eq!(p.probe().await, ProbeOutcome::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_interface_skips_network() {
        let transport = ScriptedTransport::new(Duration::from_millis(10), false);
        let p = prober(transport.clone(), Arc::new(ManualPlatform::new(false)), 2000, 3000);
        assert_eq!(p.probe().await, ProbeOutcome::Failure);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_is_failure() {
        let transport = ScriptedTransport::new(Duration::from_secs(60), false);
        let p = prober(transport, Arc::new(ManualPlatform::new(true)), 2000, 3000);
        assert_eq!(p.probe().await, ProbeOutcome::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_timeout_is_timed_out() {
        // Fetch deadline longer than the overall one: the outer race wins.
        let transport = ScriptedTransport::new(Duration::from_secs(60), false);
        let p = prober(transport, Arc::new(ManualPlatform::new(true)), 10_000, 3000);

        let started = time::Instant::now();
        assert_eq!(p.probe().await, ProbeOutcome::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000) && elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_fetch_is_cache_busted() {
        let transport = ScriptedTransport::new(Duration::from_millis(1), false);
        let p = prober(transport.clone(), Arc::new(ManualPlatform::new(true)), 2000, 3000);
        p.probe().await;
        p.probe().await;

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        for url in seen.iter() {
            assert_eq!(url.path(), "/favicon.ico");
            assert!(url.query_pairs().any(|(k, _)| k == CACHE_BUST_PARAM));
        }
    }

    #[test]
    fn test_cache_bust_keeps_existing_query() {
        let url = Url::parse("https://example.com/ping?site=a").unwrap();
        let busted = cache_busted(&url);
        let pairs: Vec<(String, String)> = busted.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("site".to_string(), "a".to_string()));
        assert_eq!(pairs[1].0, CACHE_BUST_PARAM);
    }
}
