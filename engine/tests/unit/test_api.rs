//! HTTP API tests, served in-process

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use landing_zone::deploy::Orchestrator;
use landing_zone::filesys::dir::Dir;
use landing_zone::server::serve::router;
use landing_zone::server::state::ServerState;

use crate::support::{orchestrator, sample_request, ScriptedRunner};

async fn app() -> (Router, Arc<Orchestrator>, Dir) {
    let (orchestrator, root) = orchestrator(Arc::new(ScriptedRunner::new())).await;
    let app = router(Arc::new(ServerState::new(orchestrator.clone())));
    (app, orchestrator, root)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _, root) = app().await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "landing-zone");

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_status_is_idle_before_any_deployment() {
    let (app, _, root) = app().await;

    let (status, body) = send(&app, get("/api/deployment/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "idle");
    assert_eq!(body["data"]["progress"], 0);

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_deploy_then_poll_status() {
    let (app, orchestrator, root) = app().await;

    let (status, body) = send(
        &app,
        post_json("/api/deploy", sample_request().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let deployment_id = body["deploymentId"].as_str().unwrap().to_string();

    orchestrator.wait().await;

    let (_, body) = send(&app, get("/api/deployment/status")).await;
    let data = &body["data"];
    assert_eq!(data["status"], "completed");
    assert_eq!(data["progress"], 100);
    assert_eq!(data["result"]["deploymentId"], deployment_id.as_str());
    assert_eq!(data["result"]["cloudProvider"], "aws");
    assert!(data["topology"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|node| node["type"] == "load-balancer"));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_invalid_request_is_a_bad_request() {
    let (app, orchestrator, root) = app().await;

    let mut request = sample_request();
    request["vpc"] = json!({"name": "main", "cidr": "not-a-cidr"});

    let (status, body) = send(&app, post_json("/api/deploy", request.to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("not-a-cidr"));
    assert_eq!(
        orchestrator.query_status().status,
        landing_zone::models::status::DeploymentPhase::Idle
    );

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_malformed_body_is_a_bad_request() {
    let (app, _, root) = app().await;

    let (status, body) = send(&app, post_json("/api/deploy", "{\"cloudProvider\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    root.delete().await.unwrap();
}
