//! Application router

use axum::{routing::get, Router};

use crate::{
    health::{health, readiness},
    state::AppState,
    store::DocumentStore,
    users,
};

/// Full application router: user routes plus health probes
///
/// Middleware is added by [`Server`](crate::server::Server).
pub fn app<S>(state: AppState<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/health", get(health::<S>))
        .route("/ready", get(readiness::<S>))
        .merge(users::router::<S>())
        .with_state(state)
}
