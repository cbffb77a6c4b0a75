use crate::{
    AppState, access,
    models::{DecisionQuery, DecisionReport, HealthResponse},
    session::Session,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

// --- Handlers ---

/// health
///
/// [Ungated] Liveness probe for load balancers. Never consults the upstream API.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Gate is running", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// ready
///
/// [Ungated] Readiness probe. Reports degraded when the marketplace REST API
/// cannot be reached through the shared API client.
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Upstream API reachable", body = HealthResponse),
        (status = 503, description = "Upstream API unreachable", body = HealthResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.api.get::<serde_json::Value>("health").await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse::ok())),
        Err(e) => {
            tracing::warn!(error = %e, "upstream API readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    detail: Some(e.to_string()),
                }),
            )
        }
    }
}

/// get_decision
///
/// [Ungated] Evaluates the access policy for `path` against the caller's own
/// cookies without navigating there.
#[utoipa::path(
    get,
    path = "/gate/decision",
    params(DecisionQuery),
    responses(
        (status = 200, description = "Decision for the path", body = DecisionReport),
        (status = 400, description = "Path is not absolute or not canonicalizable")
    )
)]
pub async fn get_decision(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<DecisionReport>, StatusCode> {
    // Only the path takes part in the decision, never the query string.
    let raw = query.path.split(['?', '#']).next().unwrap_or_default();
    let path = access::canonical_path(raw).map_err(|e| {
        tracing::debug!(path = %query.path, error = %e, "decision query rejected");
        StatusCode::BAD_REQUEST
    })?;
    let decision = state.policy.decide(&path, &session);

    Ok(Json(DecisionReport::new(path, decision)))
}
