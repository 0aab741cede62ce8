//! Router-level tests: authentication, status codes and envelopes

use async_trait::async_trait;
use axum::{
  body::{to_bytes, Body},
  http::{header, Request, StatusCode},
  Router,
};
use bentley::daemon_logs::DaemonLogs;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use casebook::server::auth::{encode_basic, Credentials};
use casebook::server::routing::create_router;
use casebook::server::services::embeddings::EmbeddingProvider;
use casebook::server::services::memory_store::MemoryCaseStore;
use casebook::server::services::retrieval::RetrievalEngine;
use casebook::server::state::AppState;

const USERNAME: &str = "taller";
const PASSWORD: &str = "s3cret";

struct NoEmbeddings;

#[async_trait]
impl EmbeddingProvider for NoEmbeddings {
  async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
    None
  }
}

struct TestServer {
  router: Router,
  _temp_dir: TempDir,
}

fn server(credentials: Option<Credentials>) -> TestServer {
  let temp_dir = TempDir::new().unwrap();
  let logs = DaemonLogs::new_with_silent(temp_dir.path().join("server.logs.jsonl"), true).unwrap();
  let engine = RetrievalEngine::new(Arc::new(NoEmbeddings), Arc::new(MemoryCaseStore::new()));
  let state = AppState::new(engine, Arc::new(logs), credentials);
  TestServer { router: create_router(state), _temp_dir: temp_dir }
}

fn authed() -> TestServer {
  server(Some(Credentials::new(USERNAME, PASSWORD)))
}

fn request(method: &str, uri: &str, body: Option<Value>, auth: Option<(&str, &str)>) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = auth {
    builder = builder.header(header::AUTHORIZATION, encode_basic(user, pass));
  }
  match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
  let response = router.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let challenge = response
    .headers()
    .get(header::WWW_AUTHENTICATE)
    .map(|v| v.to_str().unwrap().to_string());
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, body, challenge)
}

fn case_body(year: i32) -> Value {
  json!({
    "title": "Aire acondicionado no enfría",
    "vehicle_model": "Vento",
    "year": year,
    "construction_group": "Climatización",
    "problem_description": "Sale aire a temperatura ambiente. El compresor no entra.",
    "solution_description": "Fuga en el condensador. Se cambió y se recargó gas."
  })
}

#[tokio::test]
async fn test_health_is_public() {
  let server = server(None);
  let (status, body, _) = send(&server.router, request("GET", "/health", None, None)).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({"status": "ok", "service": "casebook"}));
}

#[tokio::test]
async fn test_missing_credentials_are_challenged() {
  let server = authed();
  let (status, body, challenge) = send(&server.router, request("GET", "/", None, None)).await;

  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(challenge.as_deref(), Some("Basic"));
  assert_eq!(body["errors"][0]["key"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
  let server = authed();
  let (status, _, challenge) =
    send(&server.router, request("GET", "/", None, Some((USERNAME, "guess")))).await;

  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(challenge.is_some());
}

#[tokio::test]
async fn test_unconfigured_credentials_fail_closed() {
  let server = server(None);
  let (status, body, _) =
    send(&server.router, request("GET", "/", None, Some((USERNAME, PASSWORD)))).await;

  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["errors"][0]["key"], "security_not_configured");
}

#[tokio::test]
async fn test_root_with_valid_credentials() {
  let server = authed();
  let (status, body, _) =
    send(&server.router, request("GET", "/", None, Some((USERNAME, PASSWORD)))).await;

  assert_eq!(status, StatusCode::OK);
  assert!(body["message"].as_str().unwrap().contains("Authorized"));
}

#[tokio::test]
async fn test_create_case_returns_201_with_case() {
  let server = authed();
  let (status, body, _) = send(
    &server.router,
    request("POST", "/api/cases", Some(case_body(2017)), Some((USERNAME, PASSWORD))),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["case"]["id"], 1);
  assert_eq!(body["case"]["construction_group"], "Climatización");
  assert!(body["case"]["embedding"].is_null());
  assert!(body["case"]["created_at"].is_string());
}

#[tokio::test]
async fn test_out_of_range_year_is_422_with_range() {
  let server = authed();
  let (status, body, _) = send(
    &server.router,
    request("POST", "/api/cases", Some(case_body(1900)), Some((USERNAME, PASSWORD))),
  )
  .await;

  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["key"], "validation_failed");
  assert!(body["errors"][0]["message"].as_str().unwrap().contains("1950"));
}

#[tokio::test]
async fn test_unknown_construction_group_is_rejected() {
  let server = authed();
  let mut body = case_body(2017);
  body["construction_group"] = json!("Motores");

  let (status, body, _) =
    send(&server.router, request("POST", "/api/cases", Some(body), Some((USERNAME, PASSWORD)))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["key"], "validation_failed");
  assert!(body["errors"][0]["message"].as_str().unwrap().contains("Motores"));
}

#[tokio::test]
async fn test_malformed_search_body_uses_error_envelope() {
  let server = authed();
  let malformed = Request::builder()
    .method("POST")
    .uri("/api/cases/search")
    .header(header::AUTHORIZATION, encode_basic(USERNAME, PASSWORD))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{\"query\": "))
    .unwrap();

  let (status, body, _) = send(&server.router, malformed).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["key"], "validation_failed");
  assert_eq!(body["errors"][0]["context"]["rejection_status"], 400);
}

#[tokio::test]
async fn test_create_then_search_and_get() {
  let server = authed();
  let auth = Some((USERNAME, PASSWORD));
  send(&server.router, request("POST", "/api/cases", Some(case_body(2017)), auth)).await;

  let (status, body, _) = send(
    &server.router,
    request("POST", "/api/cases/search", Some(json!({"query": "compresor", "model_filter": "vento"})), auth),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["count"], 1);
  assert_eq!(body["results"][0]["score"], 0.5);
  assert!(body["results"][0].get("embedding").is_none());

  let (status, body, _) = send(&server.router, request("GET", "/api/cases/1", None, auth)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["case"]["vehicle_model"], "Vento");

  let (status, body, _) = send(&server.router, request("GET", "/api/cases/42", None, auth)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["errors"][0]["key"], "case_not_found");
  assert_eq!(body["errors"][0]["context"]["id"], 42);
}

#[tokio::test]
async fn test_search_requires_auth() {
  let server = authed();
  let (status, _, _) =
    send(&server.router, request("POST", "/api/cases/search", Some(json!({"query": "x"})), None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_groups_lists_all_eight() {
  let server = server(None);
  let (status, body, _) = send(&server.router, request("GET", "/api/cases/groups", None, None)).await;

  assert_eq!(status, StatusCode::OK);
  let groups = body["groups"].as_array().unwrap();
  assert_eq!(groups.len(), 8);
  assert_eq!(groups[1], "Transmisión");
}

#[tokio::test]
async fn test_requests_are_logged() {
  let server = authed();
  let auth = Some((USERNAME, PASSWORD));
  send(&server.router, request("GET", "/health", None, None)).await;

  let (status, body, _) = send(&server.router, request("GET", "/logs?level=info", None, auth)).await;
  assert_eq!(status, StatusCode::OK);

  let logs = body["logs"].as_array().unwrap();
  assert!(logs.iter().any(|entry| entry["context"]["path"] == "/health"
    && entry["context"]["status_code"] == 200));

  let (status, _, _) = send(&server.router, request("GET", "/logs?level=loud", None, auth)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
