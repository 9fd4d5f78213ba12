//! Version polling
//!
//! Polls the version-check endpoint and compares an opaque token against
//! the last one seen. The first check only records a baseline; a later
//! differing token calls [`ChangeHandler::on_change`] and, after
//! `reload_delay`, [`ChangeHandler::reload`]. At most one check is in
//! flight at a time: a tick that finds one running is skipped.

use crate::config::ChangeDetectorConfig;
use crate::http::{MenuSource, VersionSource};
use crate::store::{LoadOutcome, MenuStore};
use crate::ClientError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Length of the token taken from payloads without `hash` or `lastModified`
const RAW_TOKEN_LEN: usize = 100;

/// Extract the comparison token from a version-check payload
///
/// Uses `hash`, else `lastModified`, else the first 100 characters of the
/// serialized payload. Falsy values (null, `false`, `0`, `""`) are skipped.
pub fn version_token(payload: &Value) -> String {
    for key in ["hash", "lastModified"] {
        match payload.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(value) if is_truthy(value) => return value.to_string(),
            _ => {}
        }
    }
    payload.to_string().chars().take(RAW_TOKEN_LEN).collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Callbacks fired by [`ChangeDetector`]
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    /// The token moved from `previous` to `current`
    fn on_change(&self, previous: &str, current: &str) {
        let _ = (previous, current);
    }

    /// A check failed; polling continues
    fn on_error(&self, error: &ClientError) {
        let _ = error;
    }

    /// Full refresh, fired `reload_delay` after `on_change`
    async fn reload(&self);
}

#[async_trait]
impl<S: MenuSource + 'static> ChangeHandler for MenuStore<S> {
    fn on_change(&self, previous: &str, current: &str) {
        tracing::info!(previous, current, "Menu changed on server");
    }

    async fn reload(&self) {
        if let LoadOutcome::Fallback { error } = self.reload().await {
            tracing::warn!(%error, "Reload after change fell back");
        }
    }
}

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// First successful check; token stored
    Baseline,
    Unchanged,
    Changed { previous: String, current: String },
    /// Another check was in flight, or polling was stopped meanwhile
    Skipped,
    Failed { error: String },
}

struct Inner<V, H> {
    source: V,
    handler: Arc<H>,
    config: ChangeDetectorConfig,
    baseline: Mutex<Option<String>>,
    in_flight: AtomicBool,
    checks: AtomicU64,
}

/// Clears the in-flight flag when a check ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<V: VersionSource + 'static, H: ChangeHandler> Inner<V, H> {
    async fn check(self: Arc<Self>, session: CancellationToken) -> CheckOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::trace!("Version check already in flight, skipping");
            return CheckOutcome::Skipped;
        }
        let _guard = InFlight(&self.in_flight);
        self.checks.fetch_add(1, Ordering::SeqCst);

        let result = tokio::select! {
            _ = session.cancelled() => return CheckOutcome::Skipped,
            result = self.source.fetch_version() => result,
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Version check failed");
                self.handler.on_error(&e);
                return CheckOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let current = version_token(&payload);
        let previous = self.baseline.lock().replace(current.clone());
        match previous {
            None => {
                tracing::debug!(token = %current, "Version baseline recorded");
                CheckOutcome::Baseline
            }
            Some(previous) if previous == current => CheckOutcome::Unchanged,
            Some(previous) => {
                tracing::info!(%previous, %current, "Menu version changed");
                self.handler.on_change(&previous, &current);
                self.schedule_reload(session);
                CheckOutcome::Changed { previous, current }
            }
        }
    }

    fn schedule_reload(&self, session: CancellationToken) {
        let handler = self.handler.clone();
        let delay = self.config.reload_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = session.cancelled() => {
                    tracing::debug!("Pending reload cancelled");
                }
                _ = tokio::time::sleep(delay) => handler.reload().await,
            }
        });
    }
}

/// Polls a [`VersionSource`] and notifies a [`ChangeHandler`]
pub struct ChangeDetector<V, H> {
    inner: Arc<Inner<V, H>>,
    session: Mutex<CancellationToken>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<V: VersionSource + 'static, H: ChangeHandler> ChangeDetector<V, H> {
    pub fn new(source: V, handler: Arc<H>, config: ChangeDetectorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                handler,
                config,
                baseline: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                checks: AtomicU64::new(0),
            }),
            session: Mutex::new(CancellationToken::new()),
            poller: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ChangeDetectorConfig {
        &self.inner.config
    }

    /// Poll at the configured interval
    pub fn start(&self) -> bool {
        self.start_polling(self.inner.config.interval)
    }

    /// Check now and then every `interval`. Restarts polling if already
    /// running. Returns `false` when the detector is disabled.
    pub fn start_polling(&self, interval: Duration) -> bool {
        if !self.inner.config.enabled {
            tracing::debug!("Change detection disabled");
            return false;
        }
        self.stop_polling();

        let session = self.session.lock().clone();
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = session.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::spawn(inner.clone().check(session.clone()));
                    }
                }
            }
        });
        *self.poller.lock() = Some(handle);
        tracing::info!(interval_ms = interval.as_millis() as u64, "Change detection started");
        true
    }

    /// Stop polling and cancel pending reloads and in-flight checks.
    /// Safe to call any number of times.
    pub fn stop_polling(&self) {
        let previous = std::mem::replace(&mut *self.session.lock(), CancellationToken::new());
        previous.cancel();
        if self.poller.lock().take().is_some() {
            tracing::info!("Change detection stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    /// Run one check in the background without touching the interval
    pub fn force_check(&self) {
        let session = self.session.lock().clone();
        tokio::spawn(self.inner.clone().check(session));
    }

    /// Run one check and wait for its outcome
    pub async fn check_now(&self) -> CheckOutcome {
        let session = self.session.lock().clone();
        self.inner.clone().check(session).await
    }

    /// Last token seen
    pub fn baseline(&self) -> Option<String> {
        self.inner.baseline.lock().clone()
    }

    /// Checks that reached the network
    pub fn checks_performed(&self) -> u64 {
        self.inner.checks.load(Ordering::SeqCst)
    }
}

impl<V, H> Drop for ChangeDetector<V, H> {
    fn drop(&mut self) {
        self.session.lock().cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientResult;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Serves payloads in order, repeating the last one
    struct Versions {
        payloads: Mutex<Vec<ClientResult<Value>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Versions {
        fn new(payloads: Vec<ClientResult<Value>>) -> Self {
            Self {
                payloads: Mutex::new(payloads),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn hashes(hashes: &[&str]) -> Self {
            Self::new(hashes.iter().map(|h| Ok(json!({ "hash": h }))).collect())
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl VersionSource for Versions {
        async fn fetch_version(&self) -> ClientResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let mut payloads = self.payloads.lock();
            if payloads.len() > 1 {
                payloads.remove(0)
            } else {
                match payloads.first() {
                    Some(Ok(v)) => Ok(v.clone()),
                    _ => Err(ClientError::Internal("no payload".into())),
                }
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        changes: AtomicUsize,
        errors: AtomicUsize,
        reloads: AtomicUsize,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        fn on_change(&self, _previous: &str, _current: &str) {
            self.changes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &ClientError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        async fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn detector(
        source: Versions,
    ) -> (ChangeDetector<Arc<Versions>, Recorder>, Arc<Versions>, Arc<Recorder>) {
        let source = Arc::new(source);
        let recorder = Arc::new(Recorder::default());
        let detector = ChangeDetector::new(
            source.clone(),
            recorder.clone(),
            ChangeDetectorConfig::default(),
        );
        (detector, source, recorder)
    }

    #[test]
    fn test_version_token() {
        assert_eq!(version_token(&json!({"hash": "abc", "lastModified": "x"})), "abc");
        assert_eq!(version_token(&json!({"lastModified": "2025-01-01"})), "2025-01-01");
        assert_eq!(version_token(&json!({"hash": "", "lastModified": "t"})), "t");
        assert_eq!(version_token(&json!({"hash": 42})), "42");
        assert_eq!(version_token(&json!({"hash": 0, "lastModified": "t"})), "t");
        assert_eq!(version_token(&json!({"hash": false, "lastModified": "t"})), "t");
        assert_eq!(
            version_token(&json!({"hash": null, "lastModified": 0, "v": 1})),
            r#"{"hash":null,"lastModified":0,"v":1}"#
        );

        let long = json!({ "data": "x".repeat(300) });
        let token = version_token(&long);
        assert_eq!(token.chars().count(), 100);
        assert!(token.starts_with("{\"data\":\"xxx"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_fires_once_per_transition() {
        let (detector, _, recorder) = detector(Versions::hashes(&["A", "A", "B", "B"]));

        assert_eq!(detector.check_now().await, CheckOutcome::Baseline);
        assert_eq!(detector.check_now().await, CheckOutcome::Unchanged);
        assert_eq!(
            detector.check_now().await,
            CheckOutcome::Changed {
                previous: "A".into(),
                current: "B".into()
            }
        );
        assert_eq!(detector.check_now().await, CheckOutcome::Unchanged);
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 1);
        assert_eq!(detector.baseline().as_deref(), Some("B"));

        // Reload waits for the delay
        assert_eq!(recorder.reloads.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(recorder.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_reported_and_checking_continues() {
        let (detector, _, recorder) = detector(Versions::new(vec![
            Ok(json!({"hash": "A"})),
            Err(ClientError::Status {
                status: 500,
                body: "boom".into(),
            }),
            Ok(json!({"hash": "A"})),
        ]));

        assert_eq!(detector.check_now().await, CheckOutcome::Baseline);
        assert!(matches!(detector.check_now().await, CheckOutcome::Failed { .. }));
        assert_eq!(recorder.errors.load(Ordering::SeqCst), 1);
        assert_eq!(detector.check_now().await, CheckOutcome::Unchanged);
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_check_is_skipped() {
        let (detector, source, _) =
            detector(Versions::hashes(&["A"]).slow(Duration::from_millis(100)));
        let detector = Arc::new(detector);

        let first = {
            let detector = detector.clone();
            tokio::spawn(async move { detector.check_now().await })
        };
        tokio::task::yield_now().await;

        assert_eq!(detector.check_now().await, CheckOutcome::Skipped);
        assert_eq!(first.await.unwrap(), CheckOutcome::Baseline);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_loop() {
        let (detector, source, recorder) = detector(Versions::hashes(&["A", "A", "B", "B"]));

        assert!(detector.start_polling(Duration::from_secs(5)));
        assert!(detector.is_polling());

        // Ticks at 0s, 5s, 10s, 15s
        tokio::time::sleep(Duration::from_millis(16_000)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.reloads.load(Ordering::SeqCst), 1);

        detector.stop_polling();
        detector.stop_polling();
        assert!(!detector.is_polling());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_reload() {
        let (detector, _, recorder) = detector(Versions::hashes(&["A", "B"]));

        detector.check_now().await;
        assert!(matches!(detector.check_now().await, CheckOutcome::Changed { .. }));
        detector.stop_polling();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(recorder.changes.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.reloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_check_runs_in_background() {
        let (detector, source, _) = detector(Versions::hashes(&["A"]));

        detector.force_check();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(detector.baseline().as_deref(), Some("A"));
        assert!(!detector.is_polling());
    }

    #[tokio::test]
    async fn test_disabled_detector_does_not_poll() {
        let source = Arc::new(Versions::hashes(&["A"]));
        let detector = ChangeDetector::new(
            source.clone(),
            Arc::new(Recorder::default()),
            ChangeDetectorConfig::disabled(),
        );
        assert!(!detector.start());
        assert!(!detector.is_polling());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
