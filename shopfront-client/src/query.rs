//! Query coordination: deduplicated fetches and revalidation policies.
//!
//! A query is addressed by a cache key. `None` as a key is the "do not
//! fetch" sentinel used to gate requests behind authentication: the cache
//! is neither read nor populated and no transport call is made.

use crate::cache::{BeginFetch, CacheEvent, CacheStore, SubscriberHandle};
use shopfront_core::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Per-key revalidation configuration. Immutable once a subscription
/// starts; changing policy means unsubscribing and resubscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    /// Fixed polling interval, off when `None`.
    pub interval: Option<Duration>,
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    /// Triggers landing within this window of the last resolution share
    /// the resolved value instead of refetching.
    pub dedupe_window: Duration,
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self {
            interval: None,
            revalidate_on_focus: false,
            revalidate_on_reconnect: true,
            dedupe_window: Duration::from_secs(2),
        }
    }
}

impl RevalidationPolicy {
    /// Polling policy used by the header badges: interval refresh plus
    /// focus/reconnect revalidation.
    pub fn badge(interval: Duration, dedupe_window: Duration) -> Self {
        Self {
            interval: Some(interval),
            revalidate_on_focus: true,
            revalidate_on_reconnect: true,
            dedupe_window,
        }
    }

    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }
}

/// Environment trigger that may force revalidation of subscribed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidateSignal {
    Focus,
    Reconnect,
}

/// What a view receives: last-known data, whether a fetch is in flight,
/// and the last error, all independently present.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl QuerySnapshot {
    /// Snapshot for the `None`-key sentinel: nothing fetched, nothing
    /// loading.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Deserialize the cached value. `None` when there is no data or the
    /// shape does not match.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .clone()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// User-facing message for the last error, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ApiError::user_message)
    }

    /// True when the key has never resolved successfully - the only case
    /// where a full-page error should replace content.
    pub fn never_loaded(&self) -> bool {
        self.data.is_none()
    }
}

/// Serialize a typed API response into the cache representation.
pub fn to_cache_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Coordinates fetches against the shared [`CacheStore`].
#[derive(Clone)]
pub struct QueryCoordinator {
    store: CacheStore,
    signals: broadcast::Sender<RevalidateSignal>,
}

impl QueryCoordinator {
    pub fn new(store: CacheStore) -> Self {
        let (signals, _) = broadcast::channel(16);
        Self { store, signals }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Current state of a key without fetching.
    pub fn snapshot(&self, key: Option<&str>) -> QuerySnapshot {
        let Some(key) = key else {
            return QuerySnapshot::idle();
        };
        let entry = self.store.snapshot(key);
        QuerySnapshot {
            data: entry.data,
            loading: entry.loading,
            error: entry.error,
        }
    }

    /// Resolve `key` through the cache: serve a value resolved within the
    /// dedupe window, join an in-flight fetch, or issue exactly one
    /// transport call. The fetch is driven by a detached task, so it
    /// completes and writes through even if the caller goes away.
    pub async fn fetch<F, Fut>(
        &self,
        key: Option<&str>,
        fetcher: F,
        policy: &RevalidationPolicy,
    ) -> QuerySnapshot
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        let Some(key) = key else {
            return QuerySnapshot::idle();
        };
        match self.store.begin_fetch(key, policy.dedupe_window) {
            BeginFetch::Deduped => self.snapshot(Some(key)),
            BeginFetch::Joined(mut done) => {
                let _ = done.changed().await;
                self.snapshot(Some(key))
            }
            BeginFetch::Started { done, mut done_rx } => {
                let store = self.store.clone();
                let owned_key = key.to_string();
                tokio::spawn(async move {
                    match fetcher().await {
                        Ok(value) => store.set_data(&owned_key, value),
                        Err(error) => store.set_error(&owned_key, error),
                    }
                    let _ = done.send(true);
                });
                let _ = done_rx.changed().await;
                self.snapshot(Some(key))
            }
        }
    }

    /// Long-lived subscription: performs an initial fetch, then
    /// revalidates on the policy's interval, on focus/reconnect signals,
    /// and on explicit invalidation. Every trigger passes back through the
    /// dedupe window.
    pub fn subscribe<F, Fut>(
        &self,
        key: Option<String>,
        fetcher: F,
        policy: RevalidationPolicy,
    ) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        self.store.gc();
        let Some(key) = key else {
            return Subscription::idle(self.store.clone());
        };

        let (ui_handle, updates) = self.store.subscribe(&key);
        let (driver_handle, driver_rx) = self.store.subscribe(&key);
        let driver = self.spawn_driver(key.clone(), Arc::new(fetcher), policy, driver_rx);

        Subscription {
            key: Some(key),
            store: self.store.clone(),
            handles: vec![ui_handle, driver_handle],
            updates: Some(updates),
            driver: Some(driver),
        }
    }

    /// The window regained focus; focus-sensitive subscriptions revalidate.
    pub fn notify_focus(&self) {
        let _ = self.signals.send(RevalidateSignal::Focus);
    }

    /// Connectivity came back; reconnect-sensitive subscriptions revalidate.
    pub fn notify_reconnect(&self) {
        let _ = self.signals.send(RevalidateSignal::Reconnect);
    }

    /// Mark `key` stale and trigger refetch for its active subscribers.
    pub fn invalidate(&self, key: &str) {
        self.store.invalidate(key);
    }

    pub fn invalidate_all<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.invalidate_all(keys);
    }

    fn spawn_driver<F, Fut>(
        &self,
        key: String,
        fetcher: Arc<F>,
        policy: RevalidationPolicy,
        mut invalidations: mpsc::UnboundedReceiver<CacheEvent>,
    ) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        let coordinator = self.clone();
        let mut signals = self.signals.subscribe();
        tokio::spawn(async move {
            coordinator.refetch(&key, &fetcher, &policy).await;

            let mut ticker = policy.interval.map(|period| {
                tokio::time::interval_at(tokio::time::Instant::now() + period, period)
            });

            loop {
                tokio::select! {
                    _ = next_tick(&mut ticker) => {
                        coordinator.refetch(&key, &fetcher, &policy).await;
                    }
                    signal = signals.recv() => match signal {
                        Ok(RevalidateSignal::Focus) if policy.revalidate_on_focus => {
                            coordinator.refetch(&key, &fetcher, &policy).await;
                        }
                        Ok(RevalidateSignal::Reconnect) if policy.revalidate_on_reconnect => {
                            coordinator.refetch(&key, &fetcher, &policy).await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    event = invalidations.recv() => match event {
                        Some(CacheEvent::Invalidated { .. }) => {
                            coordinator.refetch(&key, &fetcher, &policy).await;
                        }
                        Some(CacheEvent::Updated { .. }) => {}
                        None => break,
                    },
                }
            }
        })
    }

    async fn refetch<F, Fut>(&self, key: &str, fetcher: &Arc<F>, policy: &RevalidationPolicy)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        let fetcher = Arc::clone(fetcher);
        self.fetch(Some(key), move || (fetcher)(), policy).await;
    }
}

async fn next_tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Handle for one active subscription. Dropping it unsubscribes and stops
/// the revalidation driver; an in-flight fetch still completes and writes
/// through to the cache (no hard cancellation), it just goes unobserved
/// until a new subscriber appears.
pub struct Subscription {
    key: Option<String>,
    store: CacheStore,
    handles: Vec<SubscriberHandle>,
    updates: Option<mpsc::UnboundedReceiver<CacheEvent>>,
    driver: Option<JoinHandle<()>>,
}

impl Subscription {
    fn idle(store: CacheStore) -> Self {
        Self {
            key: None,
            store,
            handles: Vec::new(),
            updates: None,
            driver: None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        match &self.key {
            Some(key) => {
                let entry = self.store.snapshot(key);
                QuerySnapshot {
                    data: entry.data,
                    loading: entry.loading,
                    error: entry.error,
                }
            }
            None => QuerySnapshot::idle(),
        }
    }

    /// Await the next cache event for this key. `None` for idle
    /// subscriptions and after the store side closed.
    pub async fn changed(&mut self) -> Option<CacheEvent> {
        match &mut self.updates {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Non-blocking drain; returns whether anything changed since the last
    /// call. Suits a frame-tick UI loop.
    pub fn poll_changed(&mut self) -> bool {
        let Some(rx) = &mut self.updates else {
            return false;
        };
        let mut changed = false;
        while rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        for handle in self.handles.drain(..) {
            self.store.unsubscribe(handle);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        calls: Arc<AtomicUsize>,
        value: Value,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = ApiResult<Value>> + Send>>
           + Send
           + Sync
           + 'static {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let value = value.clone();
            Box::pin(async move { Ok(value) })
        }
    }

    #[tokio::test]
    async fn test_null_key_is_idle_and_never_fetches() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(calls.clone(), json!(1));
        let snap = coordinator
            .fetch(None, fetcher, &RevalidationPolicy::default())
            .await;
        assert!(snap.data.is_none());
        assert!(!snap.loading);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(coordinator.store().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_populates_cache() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let snap = coordinator
            .fetch(
                Some("k"),
                counting_fetcher(calls.clone(), json!({"count": 7})),
                &RevalidationPolicy::default(),
            )
            .await;
        assert_eq!(snap.data, Some(json!({"count": 7})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeat_fetch_within_window_is_deduped() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_secs(60));
        for _ in 0..5 {
            coordinator
                .fetch(Some("k"), counting_fetcher(calls.clone(), json!(1)), &policy)
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_secs(60));
        coordinator
            .fetch(Some("k"), counting_fetcher(calls.clone(), json!(1)), &policy)
            .await;
        coordinator.invalidate("k");
        coordinator
            .fetch(Some("k"), counting_fetcher(calls.clone(), json!(2)), &policy)
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.snapshot(Some("k")).data, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_failure_preserves_previous_data() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_millis(0));
        coordinator
            .fetch(Some("k"), || async { Ok(json!("cached")) }, &policy)
            .await;
        let snap = coordinator
            .fetch(
                Some("k"),
                || async { Err(ApiError::Network) },
                &policy,
            )
            .await;
        assert_eq!(snap.data, Some(json!("cached")));
        assert_eq!(snap.error, Some(ApiError::Network));
    }

    #[tokio::test]
    async fn test_subscription_initial_fetch_and_snapshot() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = coordinator.subscribe(
            Some("k".to_string()),
            counting_fetcher(calls.clone(), json!(41)),
            RevalidationPolicy::default(),
        );
        let event = sub.changed().await;
        assert!(matches!(event, Some(CacheEvent::Updated { .. })));
        assert_eq!(sub.snapshot().data, Some(json!(41)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_idle_subscription_never_fetches() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = coordinator.subscribe(
            None,
            counting_fetcher(calls.clone(), json!(1)),
            RevalidationPolicy::default(),
        );
        assert!(!sub.is_active());
        assert!(sub.changed().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_focus_signal_revalidates_when_enabled() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RevalidationPolicy {
            interval: None,
            revalidate_on_focus: true,
            revalidate_on_reconnect: false,
            dedupe_window: Duration::from_millis(0),
        };
        let mut sub = coordinator.subscribe(
            Some("k".to_string()),
            counting_fetcher(calls.clone(), json!(1)),
            policy,
        );
        sub.changed().await;
        coordinator.notify_focus();
        sub.changed().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_snapshot_data_as_typed() {
        let coordinator = QueryCoordinator::new(CacheStore::default());
        coordinator
            .fetch(
                Some("k"),
                || async { Ok(json!({"count": 9})) },
                &RevalidationPolicy::default(),
            )
            .await;
        let snap = coordinator.snapshot(Some("k"));
        let count: Option<shopfront_core::CountResponse> = snap.data_as();
        assert_eq!(count.map(|c| c.count), Some(9));
    }
}
