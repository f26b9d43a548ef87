//! HTTP API integration tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use helpers::*;
use hjury_ai::build_router;

struct TestApp {
    _dir: tempfile::TempDir,
    app: Router,
    hackathon_id: Uuid,
}

async fn test_app() -> TestApp {
    let (dir, pool) = create_test_db().await.unwrap();
    let hackathon_id = insert_hackathon(&pool, OWNER).await.unwrap();
    insert_project(&pool, hackathon_id, ProjectFixture::new("Alpha"))
        .await
        .unwrap();
    insert_project(
        &pool,
        hackathon_id,
        ProjectFixture::new("Bravo").github_url(None),
    )
    .await
    .unwrap();

    let state = test_state(pool, Arc::new(StubInspector::new()));
    TestApp {
        _dir: dir,
        app: build_router(state),
        hackathon_id,
    }
}

async fn send(app: &Router, method: &str, uri: &str, owner: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header("x-owner-id", owner);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_session(t: &TestApp) -> Uuid {
    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/hackathons/{}/jury", t.hackathon_id),
        Some(OWNER),
        Some(json!({ "eligibilityCriteria": { "repositoryAccess": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let t = test_app().await;
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hjury-ai");
}

#[tokio::test]
async fn test_owner_header_required() {
    let t = test_app().await;
    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/hackathons/{}/jury", t.hackathon_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_and_read_session() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/hackathons/{}/jury", t.hackathon_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session"].is_null());

    let session_id = create_session(&t).await;

    let (status, body) = send(&t.app, "GET", &format!("/jury/{}", session_id), Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["total_candidates"], 2);
    assert_eq!(body["eligibility_criteria"]["repositoryAccess"], true);

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/hackathons/{}/jury", t.hackathon_id),
        Some(OWNER),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send(&t.app, "GET", &format!("/jury/{}", session_id), Some("intruder"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execute_layers_and_fetch_results() {
    let t = test_app().await;
    let session_id = create_session(&t).await;

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/jury/{}/results", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"].is_string());

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/jury/{}/layers/1", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processed"], 2);
    assert_eq!(body["eliminated"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/jury/{}/live", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layers"]["1"]["status"], "completed");

    for layer in 2..=4 {
        let (status, body) = send(
            &t.app,
            "POST",
            &format!("/jury/{}/layers/{}", session_id, layer),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/jury/{}/results", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalWinners"], 1);
    assert_eq!(body["perCategoryWinners"][0]["winners"][0]["candidateName"], "Alpha");

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/jury/{}/progress", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["eliminated_count"], 1);
}

#[tokio::test]
async fn test_invalid_layer_numbers() {
    let t = test_app().await;
    let session_id = create_session(&t).await;

    for layer in ["0", "9", "abc"] {
        let (status, body) = send(
            &t.app,
            "POST",
            &format!("/jury/{}/layers/{}", session_id, layer),
            Some(OWNER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "layer {}", layer);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/jury/{}/layers/2", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reset_endpoint() {
    let t = test_app().await;
    let session_id = create_session(&t).await;
    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/jury/{}/layers/1", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/jury/{}/reset", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["current_layer"], 1);
    assert_eq!(body["eliminated_count"], 0);

    let (status, _) = send(
        &t.app,
        "GET",
        &format!("/jury/{}/live", session_id),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_route() {
    let t = test_app().await;
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/jury/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}
