//! Business logic layered between the HTTP routes and the storage backends.

/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Core session orchestration: load, mutate, persist.
pub mod session_service;
/// Periodic purge of expired session records.
pub mod session_sweeper;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
