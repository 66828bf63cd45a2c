//! Crowd Hunt Back binary entrypoint wiring the REST layer, storage
//! supervision, and session expiry sweeping.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::{session_store::SessionStore, storage::StorageError};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_config = AppConfig::load();
    let app_state = AppState::new(app_config);

    tokio::spawn(services::storage_supervisor::run(
        app_state.clone(),
        connect_store,
    ));
    tokio::spawn(services::session_sweeper::run(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build a session store from the environment: CouchDB when configured,
/// otherwise the in-process store.
async fn connect_store() -> Result<Arc<dyn SessionStore>, StorageError> {
    #[cfg(feature = "couch-store")]
    if env::var_os("COUCH_BASE_URL").is_some() {
        use crate::dao::session_store::couchdb::{CouchConfig, CouchSessionStore};

        let couch_config = CouchConfig::from_env()
            .map_err(|err| StorageError::unavailable("invalid CouchDB configuration".into(), err))?;
        let store = CouchSessionStore::connect(couch_config)
            .await
            .map_err(|err| StorageError::unavailable("CouchDB connection failed".into(), err))?;
        info!("connected to CouchDB session store");
        return Ok(Arc::new(store));
    }

    info!("no external store configured; using in-memory session store");
    Ok(Arc::new(dao::session_store::memory::MemorySessionStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
