use std::sync::Arc;
use std::time::SystemTime;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::dao::models::SessionEntity;
use crate::dao::session_store::{Revision, SessionStore, VersionedSession};
use crate::dao::storage::StorageResult;

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchSessionDocument, END_SUFFIX, SESSION_PREFIX, session_doc_id,
        session_id_from_doc,
    },
};

/// Session store backed by one CouchDB document per session.
#[derive(Clone)]
pub struct CouchSessionStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchSessionStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let mut builder = self.client.get(&url);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let mut builder = self.client.put(&url);
                if let Some((ref user, ref pass)) = self.auth {
                    builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
                }
                let create =
                    builder
                        .send()
                        .await
                        .map_err(|source| CouchDaoError::DatabaseCreate {
                            database: database.clone(),
                            source,
                        })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document; a 409 means the presented `_rev` lost a write race.
    async fn put_document<T>(
        &self,
        doc_id: &str,
        session_id: &str,
        document: &T,
    ) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                session_id: session_id.to_string(),
            }),
            status if status.is_success() => {
                #[derive(serde::Deserialize)]
                struct PutResponse {
                    rev: String,
                }
                response
                    .json::<PutResponse>()
                    .await
                    .map(|body| body.rev)
                    .map_err(|source| CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_doc_ids(&self, prefix: &str) -> CouchResult<Vec<String>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        Ok(payload.rows.into_iter().map(|row| row.id).collect())
    }
}

impl SessionStore for CouchSessionStore {
    fn save_session(
        &self,
        session: SessionEntity,
        expected_revision: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<Revision>> {
        let store = self.clone();
        Box::pin(async move {
            let session_id = session.id.clone();
            let doc_id = session_doc_id(&session_id);
            let doc = CouchSessionDocument::from_entity(session, expected_revision);
            store
                .put_document(&doc_id, &session_id, &doc)
                .await
                .map_err(Into::into)
        })
    }

    fn find_session(
        &self,
        id: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<VersionedSession>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = session_doc_id(&id);
            let maybe_doc = store.get_document::<CouchSessionDocument>(&doc_id).await?;
            Ok(maybe_doc.and_then(|doc| {
                if doc.session.expires_at <= now {
                    // Left in place for the sweeper to purge.
                    return None;
                }
                doc.rev.map(|revision| VersionedSession {
                    entity: doc.session,
                    revision,
                })
            }))
        })
    }

    fn remove_session(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = session_doc_id(&id);
            let Some(doc) = store.get_document::<CouchSessionDocument>(&doc_id).await? else {
                return Ok(());
            };
            let Some(rev) = doc.rev else {
                return Ok(());
            };

            let response = store
                .request(Method::DELETE, &doc_id)
                .query(&[("rev", rev)])
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: doc_id.clone(),
                    source,
                })?;

            match response.status() {
                // Already gone, or a concurrent writer owns the record now;
                // the sweeper will retry on its next pass.
                StatusCode::NOT_FOUND | StatusCode::CONFLICT => Ok(()),
                status if status.is_success() => Ok(()),
                other => Err(CouchDaoError::RequestStatus {
                    path: doc_id,
                    status: other,
                }
                .into()),
            }
        })
    }

    fn list_session_ids(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_ids = store.list_doc_ids(SESSION_PREFIX).await?;
            Ok(doc_ids
                .iter()
                .filter_map(|doc_id| session_id_from_doc(doc_id))
                .map(str::to_string)
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let mut builder = store.client.get(&url);
            if let Some((ref user, ref pass)) = store.auth {
                builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
            }

            let response = builder
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
