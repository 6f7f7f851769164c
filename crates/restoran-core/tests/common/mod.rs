//! In-process mock of the restoran backend.
//!
//! Every request is recorded. Responses are looked up by method and path;
//! anything unregistered gets a 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<HashMap<(Method, String), Canned>>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.insert(method, path, status, body, None)
    }

    pub fn respond_slowly(&self, method: Method, path: &str, delay: Duration) -> &Self {
        self.insert(method, path, 200, Value::Null, Some(delay))
    }

    /// Record the request at once but hold the response back for `delay`.
    pub fn respond_after(&self, method: Method, path: &str, status: u16, body: Value, delay: Duration) -> &Self {
        self.insert(method, path, status, body, Some(delay))
    }

    fn insert(&self, method: Method, path: &str, status: u16, body: Value, delay: Option<Duration>) -> &Self {
        let canned = Canned {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
        };
        self.state
            .responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), canned);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.recorded.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.recorded.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = state.responses.lock().unwrap().get(&(method, path)).cloned();
    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            (canned.status, Json(canned.body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({"message": "no route"}))).into_response(),
    }
}
