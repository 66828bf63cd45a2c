//! In-process session store used at boot, in tests, and as the fallback
//! backend when no external database is configured.

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::BoxFuture;

use crate::dao::models::SessionEntity;
use crate::dao::session_store::{Revision, SessionStore, VersionedSession};
use crate::dao::storage::{StorageError, StorageResult};

#[derive(Debug)]
struct StoredRecord {
    entity: SessionEntity,
    revision: u64,
}

/// Keyed in-memory store with per-record expiry and compare-and-swap writes.
///
/// Revisions are a monotonically increasing counter per session id,
/// formatted as the opaque [`Revision`] token.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<DashMap<String, StoredRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save_session(
        &self,
        session: SessionEntity,
        expected_revision: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<Revision>> {
        let records = self.records.clone();
        Box::pin(async move {
            let id = session.id.clone();
            match records.entry(id.clone()) {
                Entry::Occupied(mut occupied) => {
                    let current = occupied.get().revision;
                    let expected = expected_revision
                        .as_deref()
                        .and_then(|token| token.parse::<u64>().ok());
                    if expected != Some(current) {
                        return Err(StorageError::Conflict { id });
                    }
                    let next = current + 1;
                    occupied.insert(StoredRecord {
                        entity: session,
                        revision: next,
                    });
                    Ok(next.to_string())
                }
                Entry::Vacant(vacant) => {
                    if expected_revision.is_some() {
                        return Err(StorageError::Conflict { id });
                    }
                    vacant.insert(StoredRecord {
                        entity: session,
                        revision: 1,
                    });
                    Ok("1".to_string())
                }
            }
        })
    }

    fn find_session(
        &self,
        id: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<VersionedSession>>> {
        let records = self.records.clone();
        Box::pin(async move {
            let found = records.get(&id).map(|record| VersionedSession {
                entity: record.entity.clone(),
                revision: record.revision.to_string(),
            });

            match found {
                Some(versioned) if versioned.entity.expires_at <= now => {
                    records.remove(&id);
                    Ok(None)
                }
                other => Ok(other),
            }
        })
    }

    fn remove_session(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        Box::pin(async move {
            records.remove(&id);
            Ok(())
        })
    }

    fn list_session_ids(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let records = self.records.clone();
        Box::pin(async move {
            Ok(records
                .iter()
                .map(|record| record.key().clone())
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
