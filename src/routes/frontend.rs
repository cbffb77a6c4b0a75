use std::path::Path;

use crate::AppState;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

/// Guarded Front-End Router
///
/// Serves the compiled marketplace front-end. Any path without a matching
/// file falls back to `index.html` so client-side routes render.
///
/// Access Control:
/// Every request reaching this service has already been allowed by the
/// access guard layered on in `create_router`.
pub fn frontend_routes(frontend_dir: &str) -> Router<AppState> {
    let index = Path::new(frontend_dir).join("index.html");
    let assets = ServeDir::new(frontend_dir).fallback(ServeFile::new(index));

    Router::new().fallback_service(assets)
}
