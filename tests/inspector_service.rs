//! Inspector HTTP endpoints, exercised in-process.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use outcome_router::config::{parse_config, schema::ServerConfig};
use outcome_router::InspectorServer;

mod common;

fn server() -> InspectorServer {
    let config = parse_config(common::DECLARATIONS).unwrap();
    InspectorServer::new(config.build_registry().unwrap(), &config.server)
}

async fn send(server: &InspectorServer, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, request_id, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_routes_report_in_priority_order() {
    let server = server();
    let (status, request_id, body) = send(&server, get("/routes/Orders/a/b/go.do?p=v&q=w2")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(request_id.is_some());
    assert_eq!(body["path"], "/a/b/go.do");
    let names: Vec<&str> = body["operations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|op| op["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["exact", "wildcard", "paramOnly"]);
    assert_eq!(body["operations"][0]["matched_paths"], json!(["/a/b/go.do"]));
}

#[tokio::test]
async fn test_routes_report_allowed_methods() {
    let server = server();
    let (status, _, body) = send(&server, get("/routes/Orders/orders/save")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operations"], json!([]));
    assert_eq!(body["allowed_methods"], json!(["POST"]));
}

#[tokio::test]
async fn test_unknown_handler_is_not_found() {
    let server = server();
    let (status, _, body) = send(&server, get("/routes/Missing/x")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown handler 'Missing'");
}

#[tokio::test]
async fn test_ambiguous_mapping_is_conflict() {
    let server = InspectorServer::new(common::registry(), &ServerConfig::default());
    let (status, _, body) = send(&server, get("/routes/Overloaded/neither.do?p=1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Overloaded::first#0"));
}

#[tokio::test]
async fn test_request_id_preserved() {
    let server = server();
    let request = Request::builder()
        .uri("/handlers")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let (status, request_id, body) = send(&server, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request_id.as_deref(), Some("trace-me"));
    assert_eq!(body, json!(["Orders"]));
}

#[tokio::test]
async fn test_navigate_uses_request_route_order() {
    let server = server();
    let (status, _, body) = send(
        &server,
        post_json("/navigate/Orders", json!({ "outcome": "mon2", "path": "/a/b/go.do" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"]["location"], "mto2");

    let (_, _, body) = send(&server, post_json("/navigate/Orders", json!({ "outcome": "mon2" }))).await;
    assert_eq!(body["destination"]["location"], "cto2");
}

#[tokio::test]
async fn test_navigate_fault_and_no_match() {
    let server = server();
    let fault = json!({
        "fault": { "kind": "RuntimeException", "cause": { "kind": "IllegalStateException" } }
    });
    let (_, _, body) = send(&server, post_json("/navigate/Orders", fault)).await;
    assert_eq!(body["destination"]["location"], "ceto1");

    let (status, _, body) = send(&server, post_json("/navigate/Orders", json!({ "outcome": "unknown" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"], Value::Null);
}

#[tokio::test]
async fn test_navigate_rejects_unknown_verb() {
    let server = server();
    let (status, _, _) = send(
        &server,
        post_json("/navigate/Orders", json!({ "outcome": "x", "path": "/a", "method": "FETCH" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reload_swaps_registry() {
    let server = server();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let reloader = server.spawn_reloader(rx);

    let mut config = parse_config(common::DECLARATIONS).unwrap();
    config.handlers[0].name = "Invoices".into();
    tx.send(config).unwrap();
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), reloader).await.unwrap().unwrap();

    let (_, _, body) = send(&server, get("/handlers")).await;
    assert_eq!(body, json!(["Invoices"]));
}
