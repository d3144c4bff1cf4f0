//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use tablero::api::ApiServer;
use tower::ServiceExt;

mod common;
use common::{FAKE_AUDIO, MockProvider, inference_error, workflow};

/// Build a test API router over a mock-backed workflow
fn build_test_router(
    provider: &MockProvider,
    api_key: Option<&str>,
    dir: &tempfile::TempDir,
) -> Router {
    ApiServer::new(workflow(provider, api_key, dir), 0).router()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn stroke() -> serde_json::Value {
    serde_json::json!({ "points": [{ "x": 10.0, "y": 20.0 }, { "x": 40.0, "y": 20.0 }] })
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&MockProvider::new(), None, &dir);

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_board_snapshot_hides_key() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&MockProvider::new(), Some("sk-secret"), &dir);

    let response = send(&app, "GET", "/api/board", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["state"], "idle");
    assert_eq!(json["settings"]["has_api_key"], true);
    assert_eq!(json["settings"]["language"], "es");
    assert_eq!(json["settings"]["stroke_color"], "#000000");
    assert_eq!(json["canvas"]["blank"], true);
    assert!(!json.to_string().contains("sk-secret"));
}

#[tokio::test]
async fn test_analyze_without_key_is_notice() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new();
    let app = build_test_router(&provider, None, &dir);

    send(&app, "POST", "/api/strokes", Some(stroke())).await;
    let response = send(&app, "POST", "/api/analyze", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "notice");
    assert_eq!(json["notice"], "api_key_required");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_full_flow() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new();
    provider.push_description(Ok("Un sol sonriente".to_string()));
    provider.push_story(Ok("Había una vez un sol.".to_string()));
    let app = build_test_router(&provider, None, &dir);

    let response = send(
        &app,
        "PUT",
        "/api/settings",
        Some(serde_json::json!({ "api_key": "sk-test", "stroke_width": 8 })),
    )
    .await;
    let json = json_body(response).await;
    assert_eq!(json["settings"]["has_api_key"], true);
    assert_eq!(json["settings"]["stroke_width"], 8);

    let json = json_body(send(&app, "POST", "/api/strokes", Some(stroke())).await).await;
    assert_eq!(json["status"], "drawn");
    assert_eq!(json["state"], "drawing");

    let json = json_body(send(&app, "POST", "/api/analyze", None).await).await;
    assert_eq!(json["status"], "described");
    assert_eq!(json["state"], "analyzed");
    assert_eq!(json["analysis"]["description"], "Un sol sonriente");
    assert_eq!(json["analysis"]["sequence"], 1);

    let json = json_body(send(&app, "POST", "/api/story", None).await).await;
    assert_eq!(json["status"], "narrated");
    assert_eq!(json["story"], "Había una vez un sol.");

    let response = send(&app, "POST", "/api/speech", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let audio = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&audio[..], FAKE_AUDIO);

    let json = json_body(send(&app, "GET", "/api/board", None).await).await;
    assert_eq!(json["state"], "synthesized");
    assert_eq!(json["current"]["description"], "Un sol sonriente");
    assert_eq!(json["story"], "Había una vez un sol.");
    assert_eq!(json["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_drawing_served_after_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&MockProvider::new(), Some("sk-test"), &dir);

    let response = send(&app, "GET", "/api/drawing.png", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    send(&app, "POST", "/api/strokes", Some(stroke())).await;
    send(&app, "POST", "/api/analyze", None).await;

    let response = send(&app, "GET", "/api/drawing.png", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let png = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn test_inference_failure_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new();
    provider.push_description(Err(inference_error("upstream down")));
    let app = build_test_router(&provider, Some("sk-test"), &dir);

    send(&app, "POST", "/api/strokes", Some(stroke())).await;
    let response = send(&app, "POST", "/api/analyze", None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "inference_failed");
    assert!(json["error"]["message"].as_str().unwrap().contains("upstream down"));

    let json = json_body(send(&app, "GET", "/api/board", None).await).await;
    assert_eq!(json["state"], "drawing");
    assert_eq!(json["history_len"], 0);
}

#[tokio::test]
async fn test_clear_resets_board() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&MockProvider::new(), Some("sk-test"), &dir);

    send(&app, "POST", "/api/strokes", Some(stroke())).await;
    send(&app, "POST", "/api/analyze", None).await;

    let json = json_body(send(&app, "POST", "/api/clear", None).await).await;
    assert_eq!(json["status"], "cleared");
    assert_eq!(json["state"], "idle");

    let json = json_body(send(&app, "GET", "/api/board", None).await).await;
    assert_eq!(json["canvas"]["blank"], true);
    assert_eq!(json["analysis_done"], false);
    assert!(json.get("current").is_none());
    assert_eq!(json["history_len"], 1);

    let json = json_body(send(&app, "POST", "/api/story", None).await).await;
    assert_eq!(json["notice"], "analysis_required");
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&MockProvider::new(), None, &dir);

    let response = send(
        &app,
        "PUT",
        "/api/settings",
        Some(serde_json::json!({ "stroke_color": "not-a-color" })),
    )
    .await;
    assert!(response.status().is_client_error());
}
