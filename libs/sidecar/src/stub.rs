//! Canned sidecar for gateway tests: records every request, answers with a fixed reply.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;

#[derive(Clone, Debug)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    }
}

#[derive(Clone, Debug)]
pub struct StubReply {
    status: u16,
    body: String,
}

impl StubReply {
    pub fn status(status: u16) -> Self {
        Self { status, body: String::new() }
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    seen: Arc<Mutex<Vec<Captured>>>,
}

pub struct Stub {
    port: u16,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl Stub {
    pub async fn start(reply: StubReply) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = StubState { reply, seen: seen.clone() };
        let app = Router::new().fallback(record).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { port, seen }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.seen.lock().unwrap().push(Captured {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: body.to_vec(),
    });
    let status = StatusCode::from_u16(state.reply.status).unwrap();
    (status, state.reply.body.clone())
}
