//! Mutation coordination: writes with loading state, notices, optimistic
//! pre-writes, and reconciliation by refetch.
//!
//! Failures never propagate as errors to the caller: a mutation resolves
//! to `Some(value)` or `None`, with the user-facing message delivered as a
//! notice and retained on the handle. Rollback of an optimistic value is
//! reconciliation, not snapshot/restore - the key is invalidated and the
//! next fetch restores server ground truth.

use crate::query::QueryCoordinator;
use shopfront_core::{to_user_friendly, ApiError, ApiResult};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Severity of a user-facing notice emitted by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A toast-style message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Where a mutation is in its lifecycle. `RolledBack` covers every failed
/// mutation, optimistic or not: whatever was staged is discarded in favor
/// of a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Running,
    Optimistic,
    Confirmed,
    RolledBack,
}

impl MutationPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => MutationPhase::Running,
            2 => MutationPhase::Optimistic,
            3 => MutationPhase::Confirmed,
            4 => MutationPhase::RolledBack,
            _ => MutationPhase::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            MutationPhase::Idle => 0,
            MutationPhase::Running => 1,
            MutationPhase::Optimistic => 2,
            MutationPhase::Confirmed => 3,
            MutationPhase::RolledBack => 4,
        }
    }
}

/// Per-call configuration.
#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Notice emitted on success, when set.
    pub success_message: Option<String>,
    /// Caller-supplied fallback when the server message is not mapped.
    pub error_message: Option<String>,
    /// Whether to emit notices at all.
    pub notify: bool,
    /// Keys invalidated after a successful mutation.
    pub revalidate: Vec<String>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            success_message: None,
            error_message: None,
            notify: true,
            revalidate: Vec::new(),
        }
    }
}

impl MutationOptions {
    pub fn with_success(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }

    pub fn revalidating<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.revalidate = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Hands out [`Mutation`] handles wired to the cache and the notice
/// channel.
#[derive(Clone)]
pub struct MutationCoordinator {
    queries: QueryCoordinator,
    notices: mpsc::UnboundedSender<Notice>,
}

impl MutationCoordinator {
    /// Returns the coordinator plus the receiving end of the notice
    /// channel for the UI to drain.
    pub fn new(queries: QueryCoordinator) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, rx) = mpsc::unbounded_channel();
        (Self { queries, notices }, rx)
    }

    /// A fresh per-call-site handle with its own loading flag and phase.
    pub fn mutation(&self) -> Mutation {
        Mutation {
            queries: self.queries.clone(),
            notices: self.notices.clone(),
            loading: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(AtomicU8::new(MutationPhase::Idle.as_u8())),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn emit(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}

/// One mutation call site. Cloneable so a view can keep the handle while
/// the call is awaited elsewhere; loading/phase/error are shared.
#[derive(Clone)]
pub struct Mutation {
    queries: QueryCoordinator,
    notices: mpsc::UnboundedSender<Notice>,
    loading: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    last_error: Arc<Mutex<Option<String>>>,
}

struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Mutation {
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> MutationPhase {
        MutationPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// User-facing message of the last failure, cleared on the next run.
    pub fn last_error(&self) -> Option<String> {
        match self.last_error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Run `op`. On success: success notice (when configured), targeted
    /// invalidation, `Some(value)`. On failure: resolve a user-facing
    /// message (server message -> caller fallback -> generic), emit an
    /// error notice, return `None`. The loading flag is cleared on every
    /// exit path.
    pub async fn run<T, Fut>(&self, op: Fut, options: MutationOptions) -> Option<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        self.execute(op, options, None).await
    }

    /// Optimistic flavor: pre-apply `optimistic` to `key` without marking
    /// it fresh, run `op`, then invalidate `key` on BOTH outcomes so the
    /// next fetch reconciles with server ground truth.
    pub async fn run_optimistic<T, Fut>(
        &self,
        key: &str,
        optimistic: Value,
        op: Fut,
        options: MutationOptions,
    ) -> Option<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        self.queries.store().preview(key, optimistic);
        self.execute(op, options, Some(key)).await
    }

    async fn execute<T, Fut>(
        &self,
        op: Fut,
        options: MutationOptions,
        staged_key: Option<&str>,
    ) -> Option<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        self.loading.store(true, Ordering::SeqCst);
        let _guard = LoadingGuard(Arc::clone(&self.loading));
        self.set_phase(match staged_key {
            Some(_) => MutationPhase::Optimistic,
            None => MutationPhase::Running,
        });
        self.set_error(None);

        match op.await {
            Ok(value) => {
                self.set_phase(MutationPhase::Confirmed);
                if options.notify {
                    if let Some(message) = &options.success_message {
                        let _ = self.notices.send(Notice::success(message.clone()));
                    }
                }
                if let Some(key) = staged_key {
                    self.queries.invalidate(key);
                }
                self.queries.invalidate_all(&options.revalidate);
                Some(value)
            }
            Err(error) => {
                self.set_phase(MutationPhase::RolledBack);
                let message = resolve_error_message(&error, options.error_message.as_deref());
                self.set_error(Some(message.clone()));
                if options.notify {
                    let _ = self.notices.send(Notice::error(message));
                }
                if let Some(key) = staged_key {
                    // Discard the optimistic value by refetching ground truth.
                    self.queries.invalidate(key);
                }
                None
            }
        }
    }

    fn set_phase(&self, phase: MutationPhase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    fn set_error(&self, message: Option<String>) {
        match self.last_error.lock() {
            Ok(mut guard) => *guard = message,
            Err(poisoned) => *poisoned.into_inner() = message,
        }
    }
}

/// Resolution order for the user-facing failure message: a mapped server
/// message wins, then the caller's fallback, then the generic string.
fn resolve_error_message(error: &ApiError, fallback: Option<&str>) -> String {
    match error {
        ApiError::Network | ApiError::SessionExpired => error.user_message(),
        _ => {
            if let Some(server) = error.server_message() {
                let friendly = to_user_friendly(Some(server));
                if friendly != to_user_friendly(None) {
                    return friendly.to_string();
                }
            }
            match fallback {
                Some(message) => message.to_string(),
                None => to_user_friendly(None).to_string(),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
