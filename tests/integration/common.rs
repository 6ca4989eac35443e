//! Shared helpers: a fake npm registry and an isolated environment for the binary.

use assert_cmd::Command;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Canned registry responses, served by [`FakeRegistry::start`].
#[derive(Debug, Default, Clone)]
pub struct FakeRegistry {
    responses: HashMap<(String, String), (StatusCode, String)>,
    fail_first: usize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET /{name}/{search}` with `resolved` and `deps`.
    pub fn package(self, name: &str, search: &str, resolved: &str, deps: &[(&str, &str)]) -> Self {
        let dependencies: serde_json::Map<String, serde_json::Value> =
            deps.iter().map(|(n, v)| ((*n).to_string(), serde_json::Value::from(*v))).collect();
        let body = serde_json::json!({
            "name": name,
            "version": resolved,
            "description": "served by the fake registry",
            "dependencies": dependencies,
        });
        self.raw(name, search, 200, &body.to_string())
    }

    /// Answer `GET /{name}/{search}` with an arbitrary status and body.
    pub fn raw(mut self, name: &str, search: &str, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses.insert((name.to_string(), search.to_string()), (status, body.to_string()));
        self
    }

    /// Answer the first `count` requests with `503`.
    pub fn fail_first(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    /// Serve on an ephemeral port for the rest of the test runtime.
    pub async fn start(self) -> RunningRegistry {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = FakeState {
            responses: Arc::new(self.responses),
            fail_first: self.fail_first,
            hits: Arc::clone(&hits),
        };
        let app = Router::new().route("/:name/:version", get(package_handler)).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RunningRegistry {
            url: format!("http://{address}"),
            hits,
        }
    }
}

pub struct RunningRegistry {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl RunningRegistry {
    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct FakeState {
    responses: Arc<HashMap<(String, String), (StatusCode, String)>>,
    fail_first: usize,
    hits: Arc<AtomicUsize>,
}

async fn package_handler(
    State(state): State<FakeState>,
    Path((name, version)): Path<(String, String)>,
) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    if hit < state.fail_first {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }

    match state.responses.get(&(name, version)) {
        Some((status, body)) => {
            (*status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "{\"error\":\"not found\"}").into_response(),
    }
}

/// Isolated home directory for running the binary.
pub struct TestEnv {
    home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    pub fn home(&self) -> &std::path::Path {
        self.home.path()
    }

    /// `depmap` with a private HOME, no colors and no inherited `RUST_LOG`.
    pub fn depmap(&self) -> Command {
        let mut cmd = Command::cargo_bin("depmap").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .current_dir(self.home.path());
        cmd
    }
}
