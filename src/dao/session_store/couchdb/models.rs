use serde::{Deserialize, Serialize};

use crate::dao::models::SessionEntity;

pub const SESSION_PREFIX: &str = "session::";
pub const END_SUFFIX: &str = "\u{ffff}";

/// Document id for a session record.
pub fn session_doc_id(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

/// Recover the session id from a document id, if it carries our prefix.
pub fn session_id_from_doc(doc_id: &str) -> Option<&str> {
    doc_id.strip_prefix(SESSION_PREFIX)
}

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
}

/// Couch document wrapping one session entity; `_rev` carries the
/// optimistic-concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSessionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub session: SessionEntity,
}

impl CouchSessionDocument {
    pub fn from_entity(session: SessionEntity, rev: Option<String>) -> Self {
        Self {
            id: session_doc_id(&session.id),
            rev,
            session,
        }
    }
}
