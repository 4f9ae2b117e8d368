//! Outbound client for the payment provider's HTTP API.
//!
//! Every call is bounded by a caller-supplied timeout and classified into a
//! [`ProviderError`] so handlers can decide between fallback and failure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{json, Value};
use tracing::debug;

use xpaio_common::token::{Network, TokenCreateRequest, TokenCreateResult};
use xpaio_common::Secret;

/// Header carrying the server API key on token-creation calls.
pub const API_KEY_HEADER: &str = "X-Pi-Api-Key";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error("provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("provider reply could not be used: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }
}

/// Provider API client sharing one connection pool.
#[derive(Clone, Debug)]
pub struct ProviderClient {
    http: Client,
    base_url: String,
    api_key: Secret,
}

impl ProviderClient {
    pub fn new(base_url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// `POST /v2/payments/{id}/approve`
    pub async fn approve_payment(
        &self,
        payment_id: &str,
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        let url = self.url(&["v2", "payments", payment_id, "approve"])?;
        let req = self
            .http
            .post(url)
            .header("Authorization", format!("Key {}", self.api_key.expose()))
            .json(&json!({}));
        self.send(req, timeout).await
    }

    /// `POST /v2/payments/{id}/complete` with the blockchain transaction id.
    pub async fn complete_payment(
        &self,
        payment_id: &str,
        txid: &str,
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        let url = self.url(&["v2", "payments", payment_id, "complete"])?;
        let req = self
            .http
            .post(url)
            .header("Authorization", format!("Key {}", self.api_key.expose()))
            .json(&json!({ "txid": txid }));
        self.send(req, timeout).await
    }

    /// `POST /v2/blockchain/token/create`, scoped by the user's access token.
    pub async fn create_token(
        &self,
        request: &TokenCreateRequest,
        network: Network,
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        let url = self.url(&["v2", "blockchain", "token", "create"])?;
        let body = json!({
            "name": request.name,
            "symbol": request.symbol,
            "total_supply": request.total_supply.to_string(),
            "decimals": request.decimals,
            "network": network.tag(),
            "issuer_wallet": request.issuer_wallet,
            "issuer_password": request.issuer_credential.expose(),
            "distributor_wallet": request.distributor_wallet,
            "distributor_password": request.distributor_credential.expose(),
        });
        let req = self
            .http
            .post(url)
            .bearer_auth(request.access_token.expose())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&body);
        self.send(req, timeout).await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Unreachable(format!("bad provider URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Unreachable("provider URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder, timeout: Duration) -> Result<Value, ProviderError> {
        let exchange = async {
            let resp = req
                .send()
                .await
                .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
            let status = resp.status();
            debug!(status = status.as_u16(), "provider replied");

            if !status.is_success() {
                let body: Value = resp.json().await.unwrap_or(Value::Null);
                return Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body)
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").into()),
                });
            }

            resp.json::<Value>()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ProviderError::Timeout(timeout))?
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// First usable value among `keys`. Null or empty values fall through to the
/// next key.
fn first_str(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match raw.get(*k)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Map the provider's token reply onto [`TokenCreateResult`].
///
/// A reply without any token identifier is rejected rather than filled in.
pub fn normalize_token_reply(
    raw: &Value,
    request: &TokenCreateRequest,
    network: Network,
) -> Result<TokenCreateResult, ProviderError> {
    let token_id = first_str(raw, &["token_id", "id"])
        .ok_or_else(|| ProviderError::Malformed("reply carries no token id".into()))?;
    let created_at = first_str(raw, &["created_at"])
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(TokenCreateResult {
        success: true,
        token_id,
        name: request.name.clone(),
        symbol: request.symbol.clone(),
        total_supply: request.total_supply,
        decimals: request.decimals,
        network: network.display_name().to_string(),
        created_at,
        contract_address: first_str(raw, &["contract_address", "address"]),
        transaction_hash: first_str(raw, &["transaction_hash", "tx_hash"]),
    })
}
