use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use marketplace_gate::{
    AppState, access::UnmatchedPolicy, config::AppConfig, create_router, models::DecisionReport,
};
use tower::util::ServiceExt;

// --- Helper Functions ---

const INDEX_HTML: &str = "<!doctype html><title>marketplace</title>";

/// Writes a minimal front-end build into a per-test temp directory.
fn frontend_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "marketplace-gate-{}-{}",
        std::process::id(),
        name
    ));
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(dir.join("assets").join("app.js"), "console.log('app')").unwrap();
    dir
}

fn app_with(name: &str, unmatched: UnmatchedPolicy) -> Router {
    let mut config = AppConfig::default();
    config.frontend_dir = frontend_dir(name).to_string_lossy().into_owned();
    config.unmatched_policy = unmatched;
    create_router(AppState::from_config(config).unwrap())
}

fn app(name: &str) -> Router {
    app_with(name, UnmatchedPolicy::Allow)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_health_is_ungated() {
    let response = app("health")
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains(r#""status":"ok""#));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app("request-id")
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_vendor_signin() {
    let response = app("anon-dashboard")
        .oneshot(get("/dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/auth/vendor/signin"));
}

#[tokio::test]
async fn test_user_on_dashboard_redirects_to_profile() {
    let response = app("user-dashboard")
        .oneshot(get("/dashboard", Some("accessToken=x; userRole=user")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/profile"));
}

#[tokio::test]
async fn test_restricted_admin_reaches_admin_console() {
    let response = app("restricted-admin")
        .oneshot(get(
            "/admin/dashboard",
            Some("accessToken=x; userRole=admin; userPhoneNumber=9178114124"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(location(&response), None);
    assert_eq!(body_string(response).await, INDEX_HTML);
}

#[tokio::test]
async fn test_general_admin_redirected_to_superadmin() {
    let response = app("general-admin")
        .oneshot(get(
            "/admin/dashboard",
            Some("accessToken=x; userRole=admin; userPhoneNumber=1234567890"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/superadmin/dashboard"));
}

#[tokio::test]
async fn test_vendor_detail_page_served_without_cookies() {
    let response = app("vendor-detail")
        .oneshot(get("/vendors/507f1f77bcf86cd799439011", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, INDEX_HTML);
}

#[tokio::test]
async fn test_static_asset_served_when_unlisted() {
    let response = app("asset")
        .oneshot(get("/assets/app.js", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log('app')");
}

#[tokio::test]
async fn test_query_string_ignored_by_guard() {
    let response = app("query")
        .oneshot(get("/profile?next=/auth", None))
        .await
        .unwrap();

    assert_eq!(location(&response), Some("/auth/customer/signin"));
}

#[tokio::test]
async fn test_require_auth_policy_gates_unlisted_pages() {
    let response = app_with("require-auth", UnmatchedPolicy::RequireAuth)
        .oneshot(get("/about", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/auth/customer/signin"));
}

#[tokio::test]
async fn test_decision_endpoint_reports_redirect() {
    let response = app("decision-redirect")
        .oneshot(get(
            "/gate/decision?path=/profile",
            Some("accessToken=x; userRole=vendor"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report: DecisionReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.path, "/profile");
    assert_eq!(report.outcome, "redirect");
    assert_eq!(report.location.as_deref(), Some("/dashboard"));
    assert_eq!(report.reason, "role_mismatch");
}

#[tokio::test]
async fn test_decision_endpoint_reports_allow() {
    let response = app("decision-allow")
        .oneshot(get("/gate/decision?path=/auth/admin/signin", None))
        .await
        .unwrap();

    let body = body_string(response).await;
    let report: DecisionReport = serde_json::from_str(&body).unwrap();
    assert_eq!(report.outcome, "allow");
    assert_eq!(report.reason, "public");
    assert!(!body.contains("location"));
}

#[tokio::test]
async fn test_decision_endpoint_rejects_relative_path() {
    let response = app("decision-relative")
        .oneshot(get("/gate/decision?path=profile", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_ungated() {
    let response = app("openapi")
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("/gate/decision"));
}

#[tokio::test]
async fn test_ready_reports_upstream_reachable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/health")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let mut config = AppConfig::default();
    config.frontend_dir = frontend_dir("ready-ok").to_string_lossy().into_owned();
    config.api_base_url = format!("{}/api", server.url());
    let app = create_router(AppState::from_config(config).unwrap());

    let response = app.oneshot(get("/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ready_reports_degraded_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/health")
        .with_status(502)
        .with_body(r#"{"message":"database unavailable"}"#)
        .create_async()
        .await;

    let mut config = AppConfig::default();
    config.frontend_dir = frontend_dir("ready-degraded").to_string_lossy().into_owned();
    config.api_base_url = format!("{}/api", server.url());
    let app = create_router(AppState::from_config(config).unwrap());

    let response = app.oneshot(get("/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_string(response).await;
    assert!(body.contains(r#""status":"degraded""#));
    assert!(body.contains("database unavailable"));
}

/// Front-end build that also ships a prebuilt admin page on disk.
fn app_with_admin_page(name: &str) -> Router {
    let dir = frontend_dir(name);
    std::fs::create_dir_all(dir.join("admin").join("dashboard")).unwrap();
    std::fs::write(
        dir.join("admin").join("dashboard").join("index.html"),
        "ADMIN_CONSOLE",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.frontend_dir = dir.to_string_lossy().into_owned();
    create_router(AppState::from_config(config).unwrap())
}

#[tokio::test]
async fn test_non_canonical_admin_paths_still_redirect_anonymous() {
    for uri in [
        "/admin/dashboard/",
        "//admin/dashboard/",
        "/./admin/dashboard/",
        "/%61dmin/dashboard/",
        "/admin//dashboard",
        "/%2Fadmin/dashboard",
    ] {
        let response = app_with_admin_page("admin-variants")
            .oneshot(get(uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
        assert_eq!(location(&response), Some("/auth/admin/signin"), "{uri}");
        assert!(!body_string(response).await.contains("ADMIN_CONSOLE"), "{uri}");
    }
}

#[tokio::test]
async fn test_non_canonical_profile_paths_still_redirect_anonymous() {
    for uri in ["//profile", "/./profile", "/%70rofile", "/%70%72%6f%66%69%6c%65"] {
        let response = app("profile-variants")
            .oneshot(get(uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
        assert_eq!(location(&response), Some("/auth/customer/signin"), "{uri}");
    }
}

#[tokio::test]
async fn test_encoded_general_admin_path_pins_restricted_admin() {
    let response = app("encoded-superadmin")
        .oneshot(get(
            "/%73uperadmin/dashboard",
            Some("accessToken=x; userRole=admin; userPhoneNumber=9178114124"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/admin/dashboard"));
}

#[tokio::test]
async fn test_unresolvable_paths_are_rejected() {
    for uri in ["/../admin/dashboard", "/vendors/%2e%2e/admin/dashboard", "/%ff%fe"] {
        let response = app_with_admin_page("bad-paths")
            .oneshot(get(uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(!body_string(response).await.contains("ADMIN_CONSOLE"), "{uri}");
    }
}

#[tokio::test]
async fn test_restricted_admin_reaches_prebuilt_console_page() {
    let response = app_with_admin_page("admin-page")
        .oneshot(get(
            "/admin/dashboard/",
            Some("accessToken=x; userRole=admin; userPhoneNumber=9178114124"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ADMIN_CONSOLE");
}

#[tokio::test]
async fn test_decision_endpoint_canonicalizes_path() {
    let response = app("decision-canonical")
        .oneshot(get("/gate/decision?path=//%61dmin/./dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report: DecisionReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.path, "/admin/dashboard");
    assert_eq!(report.outcome, "redirect");
    assert_eq!(report.location.as_deref(), Some("/auth/admin/signin"));
}

#[tokio::test]
async fn test_decision_endpoint_rejects_parent_segments() {
    let response = app("decision-parent")
        .oneshot(get("/gate/decision?path=/vendors/../admin", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
