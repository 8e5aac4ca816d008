//! Session state: persisted credentials and the login/logout broadcast.
//!
//! The session is the single source of truth for "is a user
//! authenticated". Credentials live in a [`CredentialStore`]; the
//! file-backed store is shared by every process of the application, so a
//! login or logout elsewhere converges here within one watcher poll.

use shopfront_core::User;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Token plus the user it belongs to, persisted and invalidated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistence behind the session. Implementations must be shareable
/// across threads; the file-backed store is also shared across processes.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>, CredentialError>;
    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

/// JSON file store, the production implementation.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let credentials = serde_json::from_str::<Credentials>(&contents)?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        Ok(self.guard().clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        *self.guard() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.guard() = None;
        Ok(())
    }
}

impl MemoryCredentialStore {
    fn guard(&self) -> std::sync::MutexGuard<'_, Option<Credentials>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Broadcast payload observable by every session-dependent subscription in
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

struct SessionInner {
    auth: Mutex<Option<Credentials>>,
    store: Box<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

/// Cheaply cloneable handle to the process-wide session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Builds the session, loading any persisted credentials.
    pub fn new(store: Box<dyn CredentialStore>) -> Result<Self, CredentialError> {
        let initial = store.load()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            inner: Arc::new(SessionInner {
                auth: Mutex::new(initial),
                store,
                events,
            }),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.guard().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.guard().as_ref().map(|c| c.token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.guard().as_ref().map(|c| c.user.clone())
    }

    /// Persist credentials, update local state synchronously, then
    /// broadcast.
    pub fn login(&self, token: String, user: User) -> Result<(), CredentialError> {
        let credentials = Credentials { token, user };
        self.inner.store.save(&credentials)?;
        *self.guard() = Some(credentials);
        let _ = self.inner.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Clear credentials and broadcast. A no-op when already logged out.
    pub fn logout(&self) -> Result<(), CredentialError> {
        {
            let mut guard = self.guard();
            if guard.is_none() {
                return Ok(());
            }
            *guard = None;
        }
        self.inner.store.clear()?;
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
        Ok(())
    }

    /// The 401 path. Idempotent: near-simultaneous expirations produce
    /// exactly one broadcast. Returns whether a logout actually happened.
    /// Store cleanup is best-effort here - the in-memory state is the
    /// authority for this process.
    pub fn expire(&self) -> bool {
        {
            let mut guard = self.guard();
            if guard.is_none() {
                return false;
            }
            *guard = None;
        }
        let _ = self.inner.store.clear();
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Re-read the store and apply an external change (another process
    /// logged in or out). Returns the event published, if state changed.
    pub fn reload_from_store(&self) -> Result<Option<SessionEvent>, CredentialError> {
        let external = self.inner.store.load()?;
        let event = {
            let mut guard = self.guard();
            if *guard == external {
                None
            } else {
                let event = match &external {
                    Some(_) => SessionEvent::LoggedIn,
                    None => SessionEvent::LoggedOut,
                };
                *guard = external;
                Some(event)
            }
        };
        if let Some(event) = event {
            let _ = self.inner.events.send(event);
        }
        Ok(event)
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Option<Credentials>> {
        match self.inner.auth.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Watch the credential store for changes made by other processes and
/// republish them on the local broadcast.
pub fn spawn_store_watcher(session: Session, poll: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            // A transient read failure is retried on the next tick.
            let _ = session.reload_from_store();
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
        }
    }

    fn memory_session() -> Session {
        Session::new(Box::new(MemoryCredentialStore::default())).unwrap()
    }

    #[test]
    fn test_fresh_session_is_unauthenticated() {
        let session = memory_session();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_login_then_logout() {
        let session = memory_session();
        session.login("tok-1".to_string(), alice()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-1"));
        session.logout().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_broadcasts_both_events() {
        let session = memory_session();
        let mut rx = session.subscribe();
        session.login("tok-1".to_string(), alice()).unwrap();
        session.logout().unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedIn);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedOut);
    }

    #[test]
    fn test_expire_broadcasts_exactly_once() {
        let session = memory_session();
        session.login("tok-1".to_string(), alice()).unwrap();
        let mut rx = session.subscribe();
        assert!(session.expire());
        assert!(!session.expire());
        assert!(!session.expire());
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedOut);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_expire_when_logged_out_is_silent() {
        let session = memory_session();
        let mut rx = session.subscribe();
        assert!(!session.expire());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_logout_when_logged_out_is_silent() {
        let session = memory_session();
        let mut rx = session.subscribe();
        session.logout().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reload_applies_external_login() {
        let store = Arc::new(MemoryCredentialStore::default());
        let session = Session::new(Box::new(SharedStore(store.clone()))).unwrap();
        assert!(!session.is_authenticated());

        // Another process writes credentials.
        store
            .save(&Credentials {
                token: "tok-9".to_string(),
                user: alice(),
            })
            .unwrap();
        let event = session.reload_from_store().unwrap();
        assert_eq!(event, Some(SessionEvent::LoggedIn));
        assert!(session.is_authenticated());

        // Unchanged store publishes nothing.
        assert_eq!(session.reload_from_store().unwrap(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        let credentials = Credentials {
            token: "tok-1".to_string(),
            user: alice(),
        };
        store.save(&credentials).unwrap();
        assert_eq!(store.load().unwrap(), Some(credentials));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    /// Adapter so two "processes" in a test share one memory store.
    struct SharedStore(Arc<MemoryCredentialStore>);

    impl CredentialStore for SharedStore {
        fn load(&self) -> Result<Option<Credentials>, CredentialError> {
            self.0.load()
        }
        fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
            self.0.save(credentials)
        }
        fn clear(&self) -> Result<(), CredentialError> {
            self.0.clear()
        }
    }
}
