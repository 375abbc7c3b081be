mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use common::{registry, test_config, MockFactory, MockPortal, SolveOutcome};
use vtop_scraper::api::{router, ApiState};
use vtop_scraper::services::PhraseClassifier;
use vtop_scraper::SessionController;

fn app(portal: &MockPortal) -> axum::Router {
    let controller = SessionController::new(
        Arc::new(test_config()),
        Arc::new(registry()),
        Arc::new(PhraseClassifier::vtop(Duration::from_millis(500))),
        Arc::new(MockFactory {
            portal: portal.clone(),
        }),
    );
    router(ApiState::new(Arc::new(controller), CancellationToken::new()))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, JsonValue) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

#[tokio::test]
async fn success_envelope_contains_data() {
    let portal = MockPortal::new();
    let (status, body) = get(app(&portal), "/vtopdata?username=21BCE0001&password=pw&semIndex=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"].as_object().unwrap().len(), 6);
    assert!(portal.evaluated_with("ATTENDANCE")[0].contains("\"VL20242501\""));
}

#[tokio::test]
async fn invalid_credentials_map_to_401() {
    let portal = MockPortal::new().solve_outcomes([SolveOutcome::Body("Invalid LoginId/Password")]);
    let (status, body) = get(app(&portal), "/vtopdata?username=21BCE0001&password=wrong").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid credentials.");
}

#[tokio::test]
async fn unverified_login_maps_to_401_login_failed() {
    let portal = MockPortal::new().solve_outcomes([SolveOutcome::Stay]);
    let (status, body) = get(app(&portal), "/vtopdata?username=21BCE0001&password=pw").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Login failed.");
}

#[tokio::test]
async fn missing_password_is_rejected_before_launching_browser() {
    let portal = MockPortal::new();
    let (status, _) = get(app(&portal), "/vtopdata?username=21BCE0001").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(portal.evaluated().is_empty());
    assert_eq!(portal.close_calls(), 0);
}
