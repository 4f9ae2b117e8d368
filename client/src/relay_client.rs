//! HTTP client for the relay service.
//!
//! [`RelayApi`] is the seam the flows depend on; [`HttpRelayClient`] is the
//! reqwest implementation used against a running relay.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use xpaio_common::relay_api::{
    ApproveBody, CompleteBody, ErrorResponse, PaymentRelayResponse, TokenCreateBody,
    APPROVE_PATH, COMPLETE_PATH, TOKEN_CREATE_PATH,
};
use xpaio_common::token::TokenCreateResult;
use xpaio_common::Secret;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelayClientError {
    #[error("relay request failed: {0}")]
    Transport(String),
    #[error("relay did not answer in time")]
    Timeout,
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("relay reply could not be parsed: {0}")]
    Decode(String),
    #[error("relay reported failure")]
    Unsuccessful,
}

#[allow(async_fn_in_trait)]
pub trait RelayApi {
    async fn approve_payment(
        &self,
        payment_id: &str,
        access_token: &Secret,
    ) -> Result<PaymentRelayResponse, RelayClientError>;

    async fn complete_payment(
        &self,
        payment_id: &str,
        txid: &str,
    ) -> Result<PaymentRelayResponse, RelayClientError>;

    async fn create_token(&self, body: &TokenCreateBody)
        -> Result<TokenCreateResult, RelayClientError>;
}

pub struct HttpRelayClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RelayClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayClientError::Timeout
                } else {
                    RelayClientError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorResponse>().await {
                Ok(err) => err.error,
                Err(_) => format!("relay returned {status}"),
            };
            return Err(RelayClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| RelayClientError::Decode(e.to_string()))
    }
}

fn require_success(resp: PaymentRelayResponse) -> Result<PaymentRelayResponse, RelayClientError> {
    if resp.success {
        Ok(resp)
    } else {
        Err(RelayClientError::Unsuccessful)
    }
}

impl RelayApi for HttpRelayClient {
    async fn approve_payment(
        &self,
        payment_id: &str,
        access_token: &Secret,
    ) -> Result<PaymentRelayResponse, RelayClientError> {
        let body = ApproveBody {
            payment_id: Some(payment_id.to_string()),
            access_token: Some(access_token.clone()),
        };
        self.post_json(APPROVE_PATH, &body)
            .await
            .and_then(require_success)
    }

    async fn complete_payment(
        &self,
        payment_id: &str,
        txid: &str,
    ) -> Result<PaymentRelayResponse, RelayClientError> {
        let body = CompleteBody {
            payment_id: Some(payment_id.to_string()),
            txid: Some(txid.to_string()),
        };
        self.post_json(COMPLETE_PATH, &body)
            .await
            .and_then(require_success)
    }

    async fn create_token(
        &self,
        body: &TokenCreateBody,
    ) -> Result<TokenCreateResult, RelayClientError> {
        self.post_json(TOKEN_CREATE_PATH, body).await
    }
}
