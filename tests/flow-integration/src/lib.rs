//! Harness for end-to-end tests: a stand-in payment provider and a relay
//! bound to ephemeral ports on localhost.

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use xpaio_common::Secret;
use xpaio_relay::config::RelayConfig;
use xpaio_relay::AppState;

pub const TEST_API_KEY: &str = "test-server-key";

/// Short enough that a hanging provider does not slow the suite down.
pub const RELAY_TIMEOUT: Duration = Duration::from_millis(300);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary. `RUST_LOG` picks
/// the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ─── Mock provider ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderBehavior {
    /// Answer every call with a plausible success payload.
    Ok,
    /// Answer every call with a 500.
    Error,
    /// Never answer within the relay's timeout.
    Hang,
    /// Succeed, but leave the token id out of token replies.
    NoTokenId,
}

/// One request as the provider saw it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

struct MockState {
    behavior: Mutex<ProviderBehavior>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockProvider {
    pub url: String,
    state: Arc<MockState>,
}

impl MockProvider {
    pub async fn start(behavior: ProviderBehavior) -> Self {
        let state = Arc::new(MockState {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn set_behavior(&self, behavior: ProviderBehavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        authorization: header("authorization"),
        api_key: header("x-pi-api-key"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let behavior = *state.behavior.lock().unwrap();
    match behavior {
        ProviderBehavior::Error => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "provider exploded" })),
            )
                .into_response();
        }
        ProviderBehavior::Hang => tokio::time::sleep(Duration::from_secs(30)).await,
        ProviderBehavior::Ok | ProviderBehavior::NoTokenId => {}
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let reply = match segments.as_slice() {
        ["v2", "payments", id, "approve"] => json!({
            "identifier": id,
            "status": { "developer_approved": true },
        }),
        ["v2", "payments", id, "complete"] => {
            let txid = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|b| b.get("txid").cloned())
                .unwrap_or(Value::Null);
            json!({
                "identifier": id,
                "transaction": { "txid": txid },
                "status": { "developer_completed": true },
            })
        }
        ["v2", "blockchain", "token", "create"] if behavior == ProviderBehavior::NoTokenId => {
            json!({ "status": "queued" })
        }
        ["v2", "blockchain", "token", "create"] => json!({
            "id": "tok-abc",
            "address": "GCONTRACT",
            "tx_hash": "hash-1",
            "created_at": "2026-01-02T03:04:05Z",
        }),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    Json(reply).into_response()
}

// ─── Relay ───────────────────────────────────────────────────────────────────

/// Relay settings pointing at `provider`, with short timeouts.
pub fn relay_config(provider: &MockProvider) -> RelayConfig {
    RelayConfig::new(provider.url.clone(), Secret::new(TEST_API_KEY)).with_timeouts(RELAY_TIMEOUT)
}

/// Serve a relay on an ephemeral port and return its base URL.
pub async fn spawn_relay(config: RelayConfig) -> String {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(config));
    tokio::spawn(async move {
        xpaio_relay::serve(listener, state).await.unwrap();
    });
    format!("http://{addr}")
}

/// POST `body` to the relay and return status plus parsed JSON reply.
pub async fn post(relay: &str, path: &str, body: &Value) -> (StatusCode, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{relay}{path}"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    let json = resp.json::<Value>().await.unwrap_or(Value::Null);
    (status, json)
}
