//! Persistence layer: entities, storage errors, and session store backends.

/// Serde entities shared between storage backends.
pub mod models;
/// Session store trait and its backends.
pub mod session_store;
/// Backend-agnostic storage errors.
pub mod storage;
