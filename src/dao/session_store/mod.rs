#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;

use crate::dao::models::SessionEntity;
use crate::dao::storage::StorageResult;

/// Opaque optimistic-concurrency token attached to every stored session.
///
/// Backends mint a fresh token on each successful write; a save carrying a
/// stale token is rejected with [`crate::dao::storage::StorageError::Conflict`].
pub type Revision = String;

/// A session entity together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct VersionedSession {
    /// The stored session.
    pub entity: SessionEntity,
    /// Token to present with the next save of this session.
    pub revision: Revision,
}

/// Abstraction over the persistence layer for game sessions.
///
/// The only capability required of a backend is a keyed get/put with
/// per-record expiry and compare-and-swap writes; records whose `expires_at`
/// has passed behave as absent.
pub trait SessionStore: Send + Sync {
    /// Write a session. `expected_revision` must match the stored revision
    /// (or be `None` for a brand-new record); on success the new revision is
    /// returned.
    fn save_session(
        &self,
        session: SessionEntity,
        expected_revision: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<Revision>>;
    /// Fetch a session by id, treating expired records as absent.
    fn find_session(
        &self,
        id: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<VersionedSession>>>;
    /// Delete a session record, if present.
    fn remove_session(&self, id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// List ids of stored sessions, expired records included (the sweeper
    /// uses this to purge them).
    fn list_session_ids(&self) -> BoxFuture<'static, StorageResult<Vec<String>>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
