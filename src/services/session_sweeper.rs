//! Background task deleting expired session records.
//!
//! Reads of expired sessions already behave as not-found; this loop reclaims
//! the storage and the per-session mutation locks behind them.

use std::time::{Duration, SystemTime};

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::state::SharedState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically list stored sessions and purge the expired ones.
pub async fn run(state: SharedState) {
    loop {
        sleep(SWEEP_INTERVAL).await;

        let Some(store) = state.session_store().await else {
            continue;
        };

        let ids = match store.list_session_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "failed to list sessions for expiry sweep");
                continue;
            }
        };

        for id in ids {
            match store.find_session(id.clone(), SystemTime::now()).await {
                // Listed but not readable: the record is expired.
                Ok(None) => {
                    if let Err(err) = store.remove_session(id.clone()).await {
                        warn!(session_id = %id, error = %err, "failed to purge expired session");
                        continue;
                    }
                    state.release_session_guard(&id);
                    debug!(session_id = %id, "purged expired session");
                }
                Ok(Some(_)) => {}
                Err(err) => {
                    warn!(session_id = %id, error = %err, "failed to read session during sweep");
                }
            }
        }
    }
}
