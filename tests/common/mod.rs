//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure: fixture paths and a
//! canned-response HTTP server standing in for the simulation manager.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::Router;
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Get the persona form fixture path
pub fn persona_fixture() -> PathBuf {
    fixture_path("persona.toml")
}

// ─────────────────────────────────────────────────────────────────
// Mock Simulation Server
// ─────────────────────────────────────────────────────────────────

/// One request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string
    pub target: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<RwLock<HashMap<String, CannedResponse>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

/// Answer from the canned table and record the request
async fn answer(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let key = format!("{} {}", method, uri.path());
    let response = state.routes.read().get(&key).cloned();
    state.requests.write().push(RecordedRequest {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        body,
    });

    let json = [(header::CONTENT_TYPE, "application/json")];
    match response {
        Some(canned) => {
            let status =
                StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, json, canned.body)
        }
        None => (StatusCode::NOT_FOUND, json, String::new()),
    }
}

/// Simulation manager stand-in answering from a table of canned responses
///
/// Routes are keyed by `"METHOD /path"` without the query string and may be
/// added after the server started. Unknown routes answer 404 with an empty body.
pub struct MockSimServer {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockSimServer {
    /// Start a mock server on an ephemeral port
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(answer).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server listener");
        let addr = listener.local_addr().expect("mock listener local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Answer `method path` with `status` and `body`
    pub fn route(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.state.routes.write().insert(
            format!("{} {}", method, path),
            CannedResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// Base URL without the API prefix
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.read().clone()
    }

    /// Requests whose target starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.target.starts_with(prefix))
            .collect()
    }
}

impl Drop for MockSimServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
    }

    #[test]
    fn test_valid_config_exists() {
        assert!(
            valid_config_fixture().exists(),
            "Valid config fixture should exist"
        );
    }

    #[test]
    fn test_invalid_config_exists() {
        assert!(
            invalid_config_fixture().exists(),
            "Invalid config fixture should exist"
        );
    }
}
