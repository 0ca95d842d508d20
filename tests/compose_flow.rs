//! Compose page and project routes against a mock analysis service

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_test::TestServer;
use serde_json::{json, Value};

use formscope_server::config::Config;
use formscope_server::routes;
use formscope_server::state::AppState;

#[derive(Clone)]
struct MockService {
    addr: SocketAddr,
    polls: Arc<AtomicU32>,
}

fn model(id: &str, status: &str, created: &str, updated: &str) -> Value {
    json!({
        "modelId": id,
        "status": status,
        "createdDateTime": created,
        "lastUpdatedDateTime": updated
    })
}

async fn list_models() -> Json<Value> {
    Json(json!({
        "modelList": [
            model("b-model", "ready", "2020-05-01T10:00:00Z", "2020-05-01T10:05:00Z"),
            model("c-model", "invalid", "2020-03-01T10:00:00Z", "2020-06-01T10:05:00Z"),
            model("a-model", "ready", "2020-04-01T10:00:00Z", "2020-04-01T10:05:00Z")
        ],
        "nextLink": null
    }))
}

async fn compose(State(mock): State<MockService>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["modelIds"].as_array().map_or(0, Vec::len) < 2 {
        return StatusCode::BAD_REQUEST.into_response();
    }

    (
        StatusCode::CREATED,
        [("location", format!("http://{}/composed/new-model", mock.addr))],
    )
        .into_response()
}

async fn composed_model(State(mock): State<MockService>) -> Json<Value> {
    let n = mock.polls.fetch_add(1, Ordering::SeqCst);
    let status = if n < 2 { "creating" } else { "ready" };
    Json(json!({
        "modelInfo": model("new-model", status, "2020-07-01T10:00:00Z", "2020-07-01T10:00:00Z")
    }))
}

async fn server() -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mock = MockService {
        addr,
        polls: Arc::new(AtomicU32::new(0)),
    };

    let app = Router::new()
        .route("/formrecognizer/v2.0/custom/models", get(list_models))
        .route("/formrecognizer/v2.0/custom/models/compose", post(compose))
        .route("/composed/new-model", get(composed_model))
        .with_state(mock);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = Config::default();
    config.service.api_uri_base = format!("http://{}/", addr);
    config.service.api_key = "test-key".to_string();
    config.service.max_retries = 0;
    config.polling.interval_ms = 20;
    config.polling.timeout_ms = 5_000;

    let state = AppState::new(config).await.unwrap();
    TestServer::new(routes::app(state)).unwrap()
}

fn model_ids(view: &Value) -> Vec<String> {
    view["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["modelId"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let server = server().await;

    let body = server.get("/health").await.json::<Value>();
    assert_eq!(body["status"], "healthy");

    server.get("/api/v1/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_refresh_and_sort() {
    let server = server().await;

    let view = server.get("/api/v1/models").await.json::<Value>();
    assert!(view["models"].as_array().unwrap().is_empty());
    assert_eq!(view["columns"][0]["column"], "modelId");
    assert_eq!(view["columns"][0]["isSorted"], true);

    let view = server.post("/api/v1/models/refresh").await.json::<Value>();
    assert_eq!(model_ids(&view), vec!["a-model", "b-model", "c-model"]);

    let view = server
        .post("/api/v1/models/sort/createdDateTime")
        .await
        .json::<Value>();
    assert_eq!(model_ids(&view), vec!["b-model", "a-model", "c-model"]);

    let view = server
        .post("/api/v1/models/sort/createdDateTime")
        .await
        .json::<Value>();
    assert_eq!(model_ids(&view), vec!["c-model", "a-model", "b-model"]);

    let view = server
        .post("/api/v1/models/sort/lastUpdatedDateTime")
        .await
        .json::<Value>();
    assert_eq!(model_ids(&view), vec!["a-model", "b-model", "c-model"]);
    assert_eq!(view["columns"][3]["isSorted"], true);
    assert_eq!(view["columns"][3]["isSortedDescending"], false);
}

#[tokio::test]
async fn test_unknown_sort_column() {
    let server = server().await;

    server
        .post("/api/v1/models/sort/size")
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compose_waits_for_ready_model() {
    let server = server().await;

    let response = server
        .post("/api/v1/models/compose")
        .json(&json!({"modelIds": ["a-model", "b-model"], "modelName": "merged"}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let composed = response.json::<Value>();
    assert_eq!(composed["modelId"], "new-model");
    assert_eq!(composed["status"], "ready");

    let view = server.get("/api/v1/models").await.json::<Value>();
    assert_eq!(view["isComposing"], false);
    assert_eq!(view["models"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_compose_needs_two_models() {
    let server = server().await;

    server
        .post("/api/v1/models/compose")
        .json(&json!({"modelIds": ["a-model"]}))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_updates() {
    let server = server().await;

    let project = server.get("/api/v1/project").await.json::<Value>();
    assert_eq!(project["modelId"], Value::Null);
    assert!(project.get("apiKey").is_none());

    let project = server
        .put("/api/v1/project/tags")
        .json(&json!([{"name": "Total", "color": "#00ff00"}]))
        .await
        .json::<Value>();
    assert_eq!(project["tags"][0]["name"], "Total");

    let project = server
        .put("/api/v1/project/model")
        .json(&json!({"modelId": "model-2"}))
        .await
        .json::<Value>();
    assert_eq!(project["modelId"], "model-2");

    let response = server.get("/api/v1/predict/script").await;
    response.assert_status_ok();
    assert!(response.text().contains("model_id = \"model-2\""));
}
