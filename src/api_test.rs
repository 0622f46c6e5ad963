use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::identity::DevIdentityProvider;
use crate::token_store::{MemoryTokenStore, TokenStore};

// =============================================================================
// STUB BACKEND
// =============================================================================

/// Minimal single-shot HTTP responder: answers every request with a fixed
/// status and body, capturing request heads for assertions.
struct StubBackend {
    base_url: String,
    requests: Arc<tokio::sync::Mutex<Vec<String>>>,
}

async fn spawn_backend(status_line: &'static str, body: &'static str) -> StubBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let captured = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let captured = Arc::clone(&captured);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut request = String::new();
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.push_str(&String::from_utf8_lossy(&buf[..n]));
                    if let Some(pos) = request.find("\r\n\r\n") {
                        let body_len = request[..pos]
                            .to_lowercase()
                            .lines()
                            .find_map(|line| line.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        if request.len() >= pos + 4 + body_len {
                            break;
                        }
                    }
                }
                captured.lock().await.push(request);
                let resp = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(resp.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    StubBackend { base_url: format!("http://{addr}"), requests }
}

struct Harness {
    api: ApiClient,
    session: Session,
    tokens: Arc<MemoryTokenStore>,
    redirects: Arc<AtomicUsize>,
    backend: StubBackend,
}

async fn harness(status_line: &'static str, body: &'static str) -> Harness {
    let provider = Arc::new(DevIdentityProvider::new().with_account("ana@example.com", "hunter2", "Ana"));
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = Session::new(provider, tokens.clone());
    let backend = spawn_backend(status_line, body).await;
    let redirects = Arc::new(AtomicUsize::new(0));
    let hook = {
        let redirects = Arc::clone(&redirects);
        Arc::new(move || {
            redirects.fetch_add(1, Ordering::SeqCst);
        })
    };
    let api = ApiClient::new(reqwest::Client::new(), backend.base_url.clone(), session.clone(), hook);
    Harness { api, session, tokens, redirects, backend }
}

async fn first_request_head(backend: &StubBackend) -> String {
    backend.requests.lock().await.first().cloned().unwrap()
}

// =============================================================================
// BEARER HEADER
// =============================================================================

#[tokio::test]
async fn request_attaches_bearer_token_when_present() {
    let h = harness("200 OK", r#"{"ok":true}"#).await;
    h.session.login("ana@example.com", "hunter2").await.unwrap();
    let token = h.session.token().unwrap();

    let _: serde_json::Value = h.api.get("/records").await.unwrap();
    let head = first_request_head(&h.backend).await.to_lowercase();
    assert!(head.contains(&format!("authorization: bearer {token}")));
}

#[tokio::test]
async fn request_omits_header_without_token() {
    let h = harness("200 OK", r#"{"ok":true}"#).await;
    let _: serde_json::Value = h.api.get("/records").await.unwrap();
    let head = first_request_head(&h.backend).await.to_lowercase();
    assert!(!head.contains("authorization:"));
}

#[tokio::test]
async fn post_sends_json_body() {
    let h = harness("200 OK", r#"{"ok":true}"#).await;
    let _: serde_json::Value = h
        .api
        .post("/records", &serde_json::json!({"title": "Urban Dreams"}))
        .await
        .unwrap();
    let head = first_request_head(&h.backend).await;
    assert!(head.contains("Urban Dreams"));
    assert!(head.to_lowercase().contains("content-type: application/json"));
}

// =============================================================================
// UNAUTHORIZED HANDLING
// =============================================================================

#[tokio::test]
async fn unauthorized_forces_logout_and_redirect_then_reraises() {
    let h = harness("401 Unauthorized", r#"{"error":"expired"}"#).await;
    h.session.login("ana@example.com", "hunter2").await.unwrap();
    assert!(h.tokens.load().await.is_some());

    let result: Result<serde_json::Value, ApiError> = h.api.get("/records").await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
    assert!(!h.session.is_authenticated());
    assert!(h.session.token().is_none());
    assert!(h.tokens.load().await.is_none());
    assert_eq!(h.redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_unauthorized_responses_keep_logout_idempotent() {
    let h = harness("401 Unauthorized", "{}").await;
    h.session.login("ana@example.com", "hunter2").await.unwrap();

    for _ in 0..3 {
        let result: Result<serde_json::Value, ApiError> = h.api.get("/records").await;
        assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
    }
    assert!(!h.session.is_authenticated());
    assert!(h.session.token().is_none());
}

// =============================================================================
// OTHER FAILURES
// =============================================================================

#[tokio::test]
async fn error_status_maps_to_status_error_with_body() {
    let h = harness("500 Internal Server Error", "boom").await;
    let result: Result<serde_json::Value, ApiError> = h.api.get("/records").await;
    match result.unwrap_err() {
        ApiError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
    // No auth side effects for non-401 failures.
    assert_eq!(h.redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_maps_to_decode_error() {
    let h = harness("200 OK", "not json").await;
    let result: Result<serde_json::Value, ApiError> = h.api.get("/records").await;
    assert!(matches!(result.unwrap_err(), ApiError::Decode(_)));
}

#[tokio::test]
async fn unreachable_backend_maps_to_transport_error() {
    let provider = Arc::new(DevIdentityProvider::new());
    let session = Session::new(provider, Arc::new(MemoryTokenStore::new()));
    let api = ApiClient::new(
        reqwest::Client::new(),
        // Reserved port with nothing listening.
        "http://127.0.0.1:1",
        session,
        Arc::new(|| {}),
    );
    let result: Result<serde_json::Value, ApiError> = api.get("/records").await;
    assert!(matches!(result.unwrap_err(), ApiError::Transport(_)));
}

#[tokio::test]
async fn delete_ignores_response_body() {
    let h = harness("204 No Content", "").await;
    h.api.delete("/records/a1").await.unwrap();
}
