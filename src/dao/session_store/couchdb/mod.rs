//! CouchDB-backed session store. Couch's `_rev` field doubles as the
//! optimistic-concurrency token required by the store contract.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::{CouchDaoError, CouchResult};
pub use store::CouchSessionStore;
