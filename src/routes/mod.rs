use axum::Router;

use crate::state::SharedState;

/// Swagger UI routes.
pub mod docs;
/// Health check routes.
pub mod health;
/// Game session action routes.
pub mod session;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(session::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
