//! Shopfront client - the data synchronization layer.
//!
//! Everything between the views and the HTTP wire lives here:
//!
//! - [`transport`]: one configured HTTP client, bearer injection, error
//!   normalization, the 401 session-expiry path.
//! - [`cache`]: the shared key/value cache with freshness metadata and
//!   subscriber fan-out.
//! - [`query`]: request deduplication and focus/reconnect/interval
//!   revalidation on top of the cache.
//! - [`mutation`]: write operations with loading state, toast notices,
//!   optimistic pre-writes, and reconciliation by refetch.
//! - [`session`]: persisted credentials, authentication state, and the
//!   login/logout broadcast.
//! - [`api`]: typed wrappers for each backend service.

pub mod api;
pub mod cache;
pub mod keys;
pub mod mutation;
pub mod query;
pub mod session;
pub mod transport;

pub use cache::{CacheEvent, CacheStore, EntrySnapshot};
pub use mutation::{Mutation, MutationCoordinator, MutationOptions, MutationPhase, Notice, NoticeLevel};
pub use query::{QueryCoordinator, QuerySnapshot, RevalidateSignal, RevalidationPolicy, Subscription};
pub use session::{CredentialError, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore, Session, SessionEvent};
pub use transport::{RequestOptions, Transport, TransportInitError};
