//! Shared cache store: key -> last-known value, freshness, subscribers.
//!
//! The store is an explicit, constructible instance owned by the
//! application root and injected into the coordinators - there is no
//! module-level singleton. Only the query and mutation coordinators write
//! to it; views read snapshots.
//!
//! At most one fetch is in flight per key: callers that want to fetch an
//! already-fetching key join the existing in-flight handle instead of
//! issuing a second call. This also means two coordinator fetches for the
//! same key can never overlap, so completion-order overwrites are not
//! observable through this store.

use shopfront_core::ApiError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

/// How long an entry with no subscribers is retained before GC.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

/// Fan-out notification for subscribers of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Data or error for the key changed.
    Updated { key: String },
    /// The key was marked stale; active subscribers should revalidate.
    Invalidated { key: String },
}

/// Read-only view of one entry.
#[derive(Debug, Clone, Default)]
pub struct EntrySnapshot {
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub loading: bool,
    pub stale: bool,
}

/// Registration of one subscriber for a key. Hand back to
/// [`CacheStore::unsubscribe`] when done.
#[derive(Debug)]
pub struct SubscriberHandle {
    key: String,
    id: u64,
}

impl SubscriberHandle {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Outcome of [`CacheStore::begin_fetch`].
pub enum BeginFetch {
    /// This caller owns the fetch. Complete it with `set_data`/`set_error`
    /// and then signal `done`.
    Started {
        done: watch::Sender<bool>,
        done_rx: watch::Receiver<bool>,
    },
    /// Another fetch for the key is already in flight; await the receiver
    /// and read the snapshot afterwards.
    Joined(watch::Receiver<bool>),
    /// The entry resolved within the dedupe window; serve the snapshot
    /// as-is.
    Deduped,
}

struct Entry {
    data: Option<Value>,
    error: Option<ApiError>,
    last_fetched_at: Option<Instant>,
    stale: bool,
    inflight: Option<watch::Receiver<bool>>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<CacheEvent>>,
    empty_since: Option<Instant>,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            last_fetched_at: None,
            stale: false,
            inflight: None,
            subscribers: HashMap::new(),
            empty_since: Some(Instant::now()),
        }
    }

    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.inflight.is_some(),
            stale: self.stale,
        }
    }

    /// Resolved within `window` and not explicitly invalidated. An error
    /// counts as resolved so a burst of triggers cannot hot-loop a failing
    /// endpoint.
    fn fresh_within(&self, window: Duration) -> bool {
        if self.stale || (self.data.is_none() && self.error.is_none()) {
            return false;
        }
        self.last_fetched_at
            .map(|at| at.elapsed() < window)
            .unwrap_or(false)
    }

    /// Send `event` to every live subscriber, dropping closed ones. Called
    /// under the store lock so all subscribers observe the update before
    /// the writer returns.
    fn notify(&mut self, event: &CacheEvent) {
        self.subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        if self.subscribers.is_empty() && self.empty_since.is_none() {
            self.empty_since = Some(Instant::now());
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    retention: Duration,
    next_subscriber: AtomicU64,
}

/// The process-wide cache, cheaply cloneable.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

impl CacheStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                retention,
                next_subscriber: AtomicU64::new(1),
            }),
        }
    }

    pub fn snapshot(&self, key: &str) -> EntrySnapshot {
        let entries = self.lock();
        entries
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_default()
    }

    /// Register a subscriber for `key`, creating the entry if needed.
    pub fn subscribe(
        &self,
        key: &str,
    ) -> (SubscriberHandle, mpsc::UnboundedReceiver<CacheEvent>) {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
        entry.subscribers.insert(id, tx);
        entry.empty_since = None;
        (
            SubscriberHandle {
                key: key.to_string(),
                id,
            },
            rx,
        )
    }

    pub fn unsubscribe(&self, handle: SubscriberHandle) {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(&handle.key) {
            entry.subscribers.remove(&handle.id);
            if entry.subscribers.is_empty() && entry.empty_since.is_none() {
                entry.empty_since = Some(Instant::now());
            }
        }
    }

    /// Decide how a fetch for `key` should proceed given the policy's
    /// dedupe window. This is the single point that enforces the
    /// one-in-flight-per-key invariant.
    pub fn begin_fetch(&self, key: &str, dedupe_window: Duration) -> BeginFetch {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
        if let Some(rx) = &entry.inflight {
            return BeginFetch::Joined(rx.clone());
        }
        if entry.fresh_within(dedupe_window) {
            return BeginFetch::Deduped;
        }
        let (done, done_rx) = watch::channel(false);
        entry.inflight = Some(done_rx.clone());
        BeginFetch::Started { done, done_rx }
    }

    /// Record a successful fetch: replaces data, clears error and stale,
    /// marks the entry fresh, releases the in-flight handle, and notifies
    /// all current subscribers before returning.
    pub fn set_data(&self, key: &str, value: Value) {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
        entry.data = Some(value);
        entry.error = None;
        entry.stale = false;
        entry.last_fetched_at = Some(Instant::now());
        entry.inflight = None;
        entry.notify(&CacheEvent::Updated {
            key: key.to_string(),
        });
    }

    /// Record a failed fetch. Last-known data is preserved - callers must
    /// be able to render stale data beside an error.
    pub fn set_error(&self, key: &str, error: ApiError) {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
        entry.error = Some(error);
        entry.stale = false;
        entry.last_fetched_at = Some(Instant::now());
        entry.inflight = None;
        entry.notify(&CacheEvent::Updated {
            key: key.to_string(),
        });
    }

    /// Optimistic pre-write: replaces the visible value WITHOUT marking the
    /// entry fresh, so the next revalidation reconciles against the server.
    pub fn preview(&self, key: &str, value: Value) {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(Entry::new);
        entry.data = Some(value);
        entry.stale = true;
        entry.notify(&CacheEvent::Updated {
            key: key.to_string(),
        });
    }

    /// Mark `key` stale and tell active subscribers to revalidate. Never
    /// clears the last-known value (stale-while-revalidate).
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.stale = true;
            entry.notify(&CacheEvent::Invalidated {
                key: key.to_string(),
            });
        }
    }

    pub fn invalidate_all<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.invalidate(key.as_ref());
        }
    }

    /// Drop entries that have had no subscribers for the retention window
    /// and have nothing in flight.
    pub fn gc(&self) {
        let retention = self.inner.retention;
        let mut entries = self.lock();
        entries.retain(|_, entry| {
            if !entry.subscribers.is_empty() || entry.inflight.is_some() {
                return true;
            }
            match entry.empty_since {
                Some(since) => since.elapsed() < retention,
                None => true,
            }
        });
    }

    /// Number of live entries, for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // Entries stay consistent across a poisoned lock; keep serving.
        match self.inner.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_of_missing_key_is_default() {
        let store = CacheStore::default();
        let snap = store.snapshot("nope");
        assert!(snap.data.is_none());
        assert!(snap.error.is_none());
        assert!(!snap.loading);
    }

    #[test]
    fn test_set_data_clears_error_and_stale() {
        let store = CacheStore::default();
        store.set_error("k", ApiError::Network);
        store.invalidate("k");
        store.set_data("k", json!({"count": 3}));
        let snap = store.snapshot("k");
        assert_eq!(snap.data, Some(json!({"count": 3})));
        assert!(snap.error.is_none());
        assert!(!snap.stale);
    }

    #[test]
    fn test_set_error_preserves_data() {
        let store = CacheStore::default();
        store.set_data("k", json!([1, 2, 3]));
        store.set_error("k", ApiError::Network);
        let snap = store.snapshot("k");
        assert_eq!(snap.data, Some(json!([1, 2, 3])));
        assert_eq!(snap.error, Some(ApiError::Network));
    }

    #[test]
    fn test_invalidate_preserves_data_and_marks_stale() {
        let store = CacheStore::default();
        store.set_data("k", json!("v"));
        store.invalidate("k");
        let snap = store.snapshot("k");
        assert_eq!(snap.data, Some(json!("v")));
        assert!(snap.stale);
    }

    #[test]
    fn test_preview_does_not_mark_fresh() {
        let store = CacheStore::default();
        store.preview("k", json!("optimistic"));
        let snap = store.snapshot("k");
        assert_eq!(snap.data, Some(json!("optimistic")));
        assert!(snap.stale);
        // A fetch immediately after a preview must not be deduped away.
        assert!(matches!(
            store.begin_fetch("k", Duration::from_secs(60)),
            BeginFetch::Started { .. }
        ));
    }

    #[test]
    fn test_subscribers_observe_set_before_it_returns() {
        let store = CacheStore::default();
        let (_handle, mut rx) = store.subscribe("k");
        store.set_data("k", json!(1));
        // Notification happened synchronously inside set_data.
        let event = rx.try_recv().expect("subscriber notified");
        assert_eq!(
            event,
            CacheEvent::Updated {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_second_fetch_within_window_is_deduped() {
        let store = CacheStore::default();
        match store.begin_fetch("k", Duration::from_secs(60)) {
            BeginFetch::Started { done, .. } => {
                store.set_data("k", json!(1));
                let _ = done.send(true);
            }
            _ => panic!("first fetch should start"),
        }
        assert!(matches!(
            store.begin_fetch("k", Duration::from_secs(60)),
            BeginFetch::Deduped
        ));
    }

    #[test]
    fn test_concurrent_fetch_joins_inflight() {
        let store = CacheStore::default();
        let first = store.begin_fetch("k", Duration::from_secs(60));
        assert!(matches!(first, BeginFetch::Started { .. }));
        assert!(matches!(
            store.begin_fetch("k", Duration::from_secs(60)),
            BeginFetch::Joined(_)
        ));
    }

    #[test]
    fn test_stale_entry_bypasses_dedupe_window() {
        let store = CacheStore::default();
        store.set_data("k", json!(1));
        store.invalidate("k");
        assert!(matches!(
            store.begin_fetch("k", Duration::from_secs(60)),
            BeginFetch::Started { .. }
        ));
    }

    #[test]
    fn test_failed_entry_is_deduped_within_window() {
        let store = CacheStore::default();
        store.set_error("k", ApiError::Network);
        assert!(matches!(
            store.begin_fetch("k", Duration::from_secs(60)),
            BeginFetch::Deduped
        ));
    }

    #[test]
    fn test_gc_requires_retention_to_elapse() {
        let store = CacheStore::new(Duration::from_secs(3600));
        store.set_data("k", json!(1));
        store.gc();
        assert_eq!(store.len(), 1);

        let quick = CacheStore::new(Duration::from_millis(0));
        quick.set_data("k", json!(1));
        quick.gc();
        assert!(quick.is_empty());
    }

    #[test]
    fn test_gc_keeps_subscribed_entries() {
        let store = CacheStore::new(Duration::from_millis(0));
        let (handle, _rx) = store.subscribe("k");
        store.set_data("k", json!(1));
        store.gc();
        assert_eq!(store.len(), 1);
        store.unsubscribe(handle);
        store.gc();
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_missing_key_is_noop() {
        let store = CacheStore::default();
        store.invalidate("missing");
        assert!(store.is_empty());
    }
}
