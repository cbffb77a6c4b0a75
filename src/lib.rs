use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod api_client;
pub mod config;
pub mod handlers;
pub mod models;
pub mod session;

// Routes split by whether the access guard applies.
pub mod routes;
use access::{AccessPolicy, Decision};
use routes::{frontend, public};
use session::Session;

// --- Public Re-exports ---

pub use api_client::{ApiClient, ApiError};
pub use config::AppConfig;

/// ApiDoc
///
/// OpenAPI document for the gate's own endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::ready, handlers::get_decision),
    components(schemas(models::DecisionReport, models::HealthResponse)),
    tags(
        (name = "marketplace-gate", description = "Marketplace access gate")
    )
)]
struct ApiDoc;

/// Shared, immutable access policy.
pub type PolicyState = Arc<AccessPolicy>;

/// AppState
///
/// Everything a request needs, cloned cheaply into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The route table and admin console rule applied to every page request.
    pub policy: PolicyState,
    /// Client for the marketplace REST API.
    pub api: ApiClient,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state from configuration. Fails on an invalid route table or API base URL.
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let policy = Arc::new(AccessPolicy::from_config(&config)?);
        let api = ApiClient::builder(config.api_base_url.clone()).build()?;
        Ok(Self {
            policy,
            api,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    RouteTable(#[from] access::RouteTableError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for PolicyState {
    fn from_ref(app_state: &AppState) -> PolicyState {
        app_state.policy.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// access_guard
///
/// Applies the access policy to a front-end request. Allowed requests continue
/// unchanged; everything else becomes a 307 to the chosen page. Paths that
/// cannot be reduced to a canonical form are answered with 400.
async fn access_guard(
    State(policy): State<PolicyState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    // Decide on the path the file service will actually resolve.
    let path = match access::canonical_path(request.uri().path()) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(uri = %request.uri(), error = %e, "access guard rejected path");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match policy.decide(&path, &session) {
        Decision::Allow(_) => next.run(request).await,
        Decision::Redirect { target, reason } => {
            tracing::debug!(
                path = %path,
                location = target.path(),
                ?reason,
                role = ?session.role,
                "access guard redirect"
            );
            Redirect::temporary(target.path()).into_response()
        }
    }
}

/// create_router
///
/// Ungated endpoints are matched first; anything else falls through to the
/// guarded front-end.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Guarded Front-End: every request reaching the static files passes the access guard.
    let guarded_frontend = frontend::frontend_routes(&state.config.frontend_dir)
        .layer(middleware::from_fn_with_state(state.clone(), access_guard))
        .with_state(state.clone());

    // 3. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .fallback_service(guarded_frontend)
        .with_state(state);

    // 4. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 4b. Request Tracing
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation back to the caller
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, tagged with the `x-request-id` set by the layer above it.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
