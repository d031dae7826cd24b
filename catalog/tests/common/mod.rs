//! Scripted search service for integration tests.
//!
//! Starts a real Axum HTTP server on a random port. Every request is recorded;
//! responses come from a (method, path) table set up by each test, with a
//! plain 200 acknowledgement for anything unscripted.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use catalog::Item;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    routes: Arc<Mutex<HashMap<(String, String), (u16, Value)>>>,
}

pub struct MockSearchService {
    pub base_url: String,
    state: MockState,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockSearchService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let router = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            state,
            _handle: handle,
        }
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .routes
            .lock()
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// (method, path) of every request, in arrival order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body,
        headers,
    });

    let (status, body) = state
        .routes
        .lock()
        .get(&(method.to_string(), path))
        .cloned()
        .unwrap_or((200, json!({"acknowledged": true})));

    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Search response whose hits are `items`, reporting `total` matches
pub fn search_hits(items: &[Item], total: u64) -> Value {
    let hits: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "_index": "item",
                "_id": item.id.to_string(),
                "_score": 1.0,
                "_source": item
            })
        })
        .collect();

    json!({
        "took": 2,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
        "hits": {
            "total": {"value": total, "relation": "eq"},
            "max_score": 1.0,
            "hits": hits
        }
    })
}

pub fn count(n: u64) -> Value {
    json!({"count": n, "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0}})
}

pub fn write_result(id: &str, result: &str) -> Value {
    json!({"_index": "item", "_id": id, "_version": 1, "result": result})
}

pub fn es_error(error_type: &str, reason: &str, status: u16) -> Value {
    json!({
        "error": {
            "root_cause": [{"type": error_type, "reason": reason}],
            "type": error_type,
            "reason": reason,
            "index": "item"
        },
        "status": status
    })
}
