use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::access::{AllowReason, Decision, RedirectReason};

// --- Gate Schemas (Output) ---

/// DecisionReport
///
/// What the gate would do with a page request for the calling session
/// (GET /gate/decision). The front-end uses it to hide links the caller would
/// only be bounced from.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct DecisionReport {
    pub path: String,
    /// "allow" | "redirect"
    pub outcome: String,
    /// Redirect destination, only present when `outcome` is "redirect".
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub location: Option<String>,
    /// Why the gate decided this way, e.g. "public" or "signin_required".
    pub reason: String,
}

impl DecisionReport {
    pub fn new(path: impl Into<String>, decision: Decision) -> Self {
        let (outcome, location, reason) = match decision {
            Decision::Allow(reason) => ("allow", None, allow_reason(reason)),
            Decision::Redirect { target, reason } => (
                "redirect",
                Some(target.path().to_string()),
                redirect_reason(reason),
            ),
        };

        Self {
            path: path.into(),
            outcome: outcome.to_string(),
            location,
            reason: reason.to_string(),
        }
    }
}

fn allow_reason(reason: AllowReason) -> &'static str {
    match reason {
        AllowReason::Public => "public",
        AllowReason::DetailPage => "detail_page",
        AllowReason::Permitted => "permitted",
        AllowReason::Unlisted => "unlisted",
    }
}

fn redirect_reason(reason: RedirectReason) -> &'static str {
    match reason {
        RedirectReason::SigninRequired => "signin_required",
        RedirectReason::RoleMismatch => "role_mismatch",
        RedirectReason::AdminConsole => "admin_console",
    }
}

/// HealthResponse
///
/// Liveness (GET /health) and readiness (GET /ready) payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct HealthResponse {
    /// "ok" | "degraded"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub detail: Option<String>,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            detail: None,
        }
    }
}

// --- Request Parameters (Input) ---

/// DecisionQuery
///
/// Query parameters for GET /gate/decision.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct DecisionQuery {
    /// Page path to evaluate, e.g. "/dashboard".
    pub path: String,
}
