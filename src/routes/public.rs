use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Ungated Router Module
///
/// Gate endpoints that never pass through the access guard: probes and the
/// decision preview. Their paths are not front-end pages, so guarding them
/// would only turn a JSON response into a redirect.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness: returns immediately without touching the upstream API.
        .route("/health", get(handlers::health))
        // GET /ready
        // Readiness: checks the marketplace REST API through the shared client.
        .route("/ready", get(handlers::ready))
        // GET /gate/decision?path=...
        // Reports allow/redirect for the caller's cookies.
        .route("/gate/decision", get(handlers::get_decision))
}
