//! In-process mock of the board service for integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Path prefix the mock serves under, like the real API version segment
pub const API_PREFIX: &str = "/1";

/// A request as the mock saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Fixed routes for exercising the client itself
    Echo,
    /// Stateful boards/lists/cards/checklists
    Boards,
}

#[derive(Clone)]
struct MockState {
    mode: Mode,
    requests: Arc<Mutex<Vec<Recorded>>>,
    boards: Arc<Mutex<BTreeMap<String, Value>>>,
    next_id: Arc<Mutex<u32>>,
}

/// Running mock server; the task stops with the test runtime
pub struct MockServer {
    pub base_url: String,
    state: MockState,
}

impl MockServer {
    /// Start the client-exercising mock
    pub async fn echo() -> Self {
        Self::start(Mode::Echo).await
    }

    /// Start the stateful board service mock
    pub async fn boards() -> Self {
        Self::start(Mode::Boards).await
    }

    async fn start(mode: Mode) -> Self {
        let state = MockState {
            mode,
            requests: Arc::default(),
            boards: Arc::default(),
            next_id: Arc::default(),
        };
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}{}", addr, API_PREFIX),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("mock received no requests")
    }

    pub fn board_count(&self) -> usize {
        self.state.boards.lock().len()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: query.clone(),
        headers: headers.clone(),
        body: body.clone(),
    });

    let Some(path) = uri.path().strip_prefix(API_PREFIX) else {
        return text(StatusCode::NOT_FOUND, "unknown API version");
    };

    match state.mode {
        Mode::Echo => echo_routes(&method, path, &headers, body).await,
        Mode::Boards => board_routes(&state, &method, path, &query),
    }
}

async fn echo_routes(method: &Method, path: &str, headers: &HeaderMap, body: Bytes) -> Response {
    match (method.as_str(), path) {
        (_, "/echo") => {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        ("POST", "/boards/") => json_response(StatusCode::CREATED, json!({"id": "abc"})),
        (_, "/not-json") => text(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
        (_, "/missing") => json_response(StatusCode::NOT_FOUND, json!({"error": "not found"})),
        (_, "/slow") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            json_response(StatusCode::OK, json!({}))
        }
        (m, p) => json_response(StatusCode::OK, json!({"method": m, "path": p})),
    }
}

fn board_routes(
    state: &MockState,
    method: &Method,
    path: &str,
    query: &HashMap<String, String>,
) -> Response {
    if !query.contains_key("key") || !query.contains_key("token") {
        return text(StatusCode::UNAUTHORIZED, "invalid key");
    }

    let param = |name: &str| query.get(name).cloned().unwrap_or_default();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["boards"]) => {
            let id = next_id(state, "b");
            let board = json!({
                "id": id,
                "name": param("name"),
                "desc": "",
                "closed": false,
                "url": format!("https://boards.example/b/{}", id),
            });
            state.boards.lock().insert(id, board.clone());
            json_response(StatusCode::OK, board)
        }
        ("GET", ["boards", id]) => match state.boards.lock().get(*id) {
            Some(board) => json_response(StatusCode::OK, board.clone()),
            None => text(StatusCode::NOT_FOUND, "The requested resource was not found."),
        },
        ("DELETE", ["boards", id]) => match state.boards.lock().remove(*id) {
            Some(_) => json_response(StatusCode::OK, json!({"_value": null})),
            None => text(StatusCode::NOT_FOUND, "The requested resource was not found."),
        },
        ("POST", ["lists"]) => {
            let id = next_id(state, "l");
            json_response(
                StatusCode::OK,
                json!({
                    "id": id,
                    "name": param("name"),
                    "idBoard": param("idBoard"),
                    "closed": false,
                }),
            )
        }
        ("PUT", ["lists", id, "closed"]) => json_response(
            StatusCode::OK,
            json!({"id": id, "name": "list", "closed": param("value") == "true"}),
        ),
        ("POST", ["cards"]) => {
            let id = next_id(state, "c");
            json_response(
                StatusCode::OK,
                json!({
                    "id": id,
                    "name": param("name"),
                    "desc": param("desc"),
                    "idList": param("idList"),
                }),
            )
        }
        ("DELETE", ["cards", _]) => json_response(StatusCode::OK, json!({"limits": {}})),
        ("POST", ["checklists"]) => {
            let id = next_id(state, "cl");
            json_response(
                StatusCode::OK,
                json!({"id": id, "name": param("name"), "idCard": param("idCard")}),
            )
        }
        _ => text(StatusCode::NOT_FOUND, "Cannot route request"),
    }
}

fn next_id(state: &MockState, prefix: &str) -> String {
    let mut next = state.next_id.lock();
    *next += 1;
    format!("{}{}", prefix, next)
}

fn json_response(status: StatusCode, value: Value) -> Response {
    (status, axum::Json(value)).into_response()
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/html")], body).into_response()
}
