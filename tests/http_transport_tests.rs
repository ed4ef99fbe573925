// End-to-end tests for the streamable HTTP transport:
// session establishment, tool calls against a mocked SearXNG backend,
// session close, and reaper eviction.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use searxng_mcp::backend::SearxClient;
use searxng_mcp::mcp::http_server::{HttpTransportState, SESSION_ID_HEADER, build_router};
use searxng_mcp::session::{SessionRegistry, reaper};
use searxng_mcp::tools::ToolContext;

fn state_for(backend: &MockServer) -> Arc<HttpTransportState> {
    let cache_ttl = Duration::from_secs(300);
    let client = Arc::new(SearxClient::new(&backend.uri(), cache_ttl));
    Arc::new(HttpTransportState {
        endpoint_path: "/mcp".to_string(),
        max_body_bytes: 1024 * 1024,
        registry: Arc::new(SessionRegistry::new()),
        tools: Arc::new(ToolContext::bound(client, cache_ttl)),
    })
}

fn rpc_post(session_id: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(id) = session_id {
        builder = builder.header(SESSION_ID_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn open_session(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(rpc_post(
            None,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "test"}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(SESSION_ID_HEADER)
        .expect("initiating POST must return a session id")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn search_tool_round_trip_through_a_session() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "news"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"title": "A", "url": "http://x", "engine": "e1"}]
        })))
        .mount(&backend)
        .await;

    let router = build_router(state_for(&backend));
    let session_id = open_session(&router).await;

    let response = router
        .oneshot(rpc_post(
            Some(&session_id),
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "search", "arguments": {"query": "news"}}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["result"]["isError"], false);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 1 results:"));
    assert!(text.contains("1. A"));
    assert!(text.contains("URL: http://x"));
    assert!(text.contains("Engine: e1"));
}

#[tokio::test]
async fn get_engines_tool_groups_by_category() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": ["general", "images"],
            "engines": [
                {"name": "duckduckgo", "categories": ["general"], "enabled": true},
                {"name": "bing images", "categories": ["images"], "enabled": false}
            ]
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let router = build_router(state_for(&backend));
    let session_id = open_session(&router).await;

    let response = router
        .oneshot(rpc_post(
            Some(&session_id),
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "get_engines", "arguments": {}}
            }),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("general:"));
    assert!(text.contains("duckduckgo [enabled]"));
    assert!(text.contains("bing images [disabled]"));
}

#[tokio::test]
async fn backend_failure_is_a_tool_error_not_a_transport_fault() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend)
        .await;

    let router = build_router(state_for(&backend));
    let session_id = open_session(&router).await;

    let response = router
        .oneshot(rpc_post(
            Some(&session_id),
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "search", "arguments": {"query": "x"}}
            }),
        ))
        .await
        .unwrap();

    // HTTP layer stays 200; the failure lives in the result envelope
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Search failed:"));
}

#[tokio::test]
async fn closed_session_id_becomes_not_found() {
    let backend = MockServer::start().await;
    let state = state_for(&backend);
    let router = build_router(state.clone());
    let session_id = open_session(&router).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/mcp")
                .header(SESSION_ID_HEADER, &session_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(rpc_post(
            Some(&session_id),
            json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reaped_session_id_becomes_not_found() {
    let backend = MockServer::start().await;
    let state = state_for(&backend);
    let router = build_router(state.clone());
    let session_id = open_session(&router).await;

    tokio::time::sleep(Duration::from_millis(40)).await;
    reaper::sweep(&state.registry, Duration::from_millis(20)).await;

    let response = router
        .oneshot(rpc_post(
            Some(&session_id),
            json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn two_sessions_hold_independent_bindings() {
    let backend = MockServer::start().await;
    let state = state_for(&backend);
    let router = build_router(state.clone());

    let first = open_session(&router).await;
    let second = open_session(&router).await;

    assert_ne!(first, second);
    assert_eq!(state.registry.len().await, 2);

    state.registry.remove(&first).await;
    assert!(state.registry.lookup(&second).await.is_some());
}
