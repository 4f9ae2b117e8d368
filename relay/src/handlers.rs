//! Relay endpoints: approve, complete and token-create.
//!
//! Each handler validates its body, makes exactly one provider call and
//! either forwards the provider payload or maps the failure. Credentials in
//! the bodies are [`Secret`]s and are never logged.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::json;
use tracing::{info, instrument, warn};

use xpaio_common::relay_api::{
    ApproveBody, CompleteBody, HealthResponse, NumberLike, PaymentRelayResponse, TokenCreateBody,
};
use xpaio_common::token::{TokenCreateRequest, TokenCreateResult, DEFAULT_DECIMALS, MAX_DECIMALS};
use xpaio_common::Secret;

use crate::error::RelayError;
use crate::provider::normalize_token_reply;
use crate::AppState;

// ─── Field helpers ───────────────────────────────────────────────────────────

/// Collects the names of missing fields so one 400 can list all of them.
#[derive(Default)]
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    fn secret(&mut self, name: &'static str, value: Option<Secret>) -> Secret {
        match value {
            Some(v) if !v.is_blank() => v,
            _ => {
                self.missing.push(name);
                Secret::default()
            }
        }
    }

    fn number(&mut self, name: &'static str, value: Option<NumberLike>) -> Option<NumberLike> {
        match value {
            Some(v) if !v.is_blank() => Some(v),
            _ => {
                self.missing.push(name);
                None
            }
        }
    }

    fn finish(self) -> Result<(), RelayError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(RelayError::MissingFields(self.missing))
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RelayError> {
    payload
        .map(|Json(b)| b)
        .map_err(|e| RelayError::BadBody(e.body_text()))
}

// ─── Payment handlers ────────────────────────────────────────────────────────

#[instrument(skip_all)]
pub async fn approve_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApproveBody>, JsonRejection>,
) -> Result<Json<PaymentRelayResponse>, RelayError> {
    let req = body(payload)?;
    let mut required = Required::default();
    let payment_id = required.text("paymentId", req.payment_id);
    // The user token only proves a signed-in caller; the provider call is
    // authorized with the server key.
    let _access_token = required.secret("accessToken", req.access_token);
    required.finish()?;

    info!(%payment_id, "approve requested");

    match state
        .provider
        .approve_payment(&payment_id, state.config.approve_timeout)
        .await
    {
        Ok(payment) => {
            info!(%payment_id, "approve confirmed by provider");
            Ok(Json(PaymentRelayResponse {
                success: true,
                payment,
                synthetic: false,
            }))
        }
        Err(e) if state.config.fallback => {
            warn!(%payment_id, error = %e, "approve failed, answering from sandbox fallback");
            Ok(Json(PaymentRelayResponse {
                success: true,
                payment: json!({
                    "identifier": payment_id,
                    "status": "approved",
                    "approved": true,
                }),
                synthetic: true,
            }))
        }
        Err(e) => {
            warn!(%payment_id, error = %e, "approve failed");
            Err(RelayError::Provider(e))
        }
    }
}

#[instrument(skip_all)]
pub async fn complete_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompleteBody>, JsonRejection>,
) -> Result<Json<PaymentRelayResponse>, RelayError> {
    let req = body(payload)?;
    let mut required = Required::default();
    let payment_id = required.text("paymentId", req.payment_id);
    let txid = required.text("txid", req.txid);
    required.finish()?;

    info!(%payment_id, %txid, "complete requested");

    match state
        .provider
        .complete_payment(&payment_id, &txid, state.config.complete_timeout)
        .await
    {
        Ok(payment) => {
            info!(%payment_id, "complete confirmed by provider");
            Ok(Json(PaymentRelayResponse {
                success: true,
                payment,
                synthetic: false,
            }))
        }
        Err(e) if state.config.fallback => {
            warn!(%payment_id, error = %e, "complete failed, answering from sandbox fallback");
            Ok(Json(PaymentRelayResponse {
                success: true,
                payment: json!({
                    "identifier": payment_id,
                    "txid": txid,
                    "status": "completed",
                    "completed": true,
                }),
                synthetic: true,
            }))
        }
        Err(e) => {
            warn!(%payment_id, error = %e, "complete failed");
            Err(RelayError::Provider(e))
        }
    }
}

// ─── Token handler ───────────────────────────────────────────────────────────

/// Validate a token-create body into a [`TokenCreateRequest`].
pub fn token_request(req: TokenCreateBody) -> Result<TokenCreateRequest, RelayError> {
    let mut required = Required::default();
    let name = required.text("name", req.name);
    let symbol = required.text("symbol", req.symbol);
    let total_supply = required.number("totalSupply", req.total_supply);
    let access_token = required.secret("accessToken", req.access_token);
    let issuer_wallet = required.text("issuerWallet", req.issuer_wallet);
    let issuer_credential = required.secret("issuerPassword", req.issuer_password);
    let distributor_wallet = required.text("distributorWallet", req.distributor_wallet);
    let distributor_credential = required.secret("distributorPassword", req.distributor_password);
    required.finish()?;

    let total_supply = total_supply
        .and_then(|n| n.as_whole())
        .filter(|n| *n > 0)
        .ok_or_else(|| RelayError::InvalidField("totalSupply must be a positive integer".into()))?;

    let decimals = match req.decimals {
        Some(d) if !d.is_blank() => d
            .as_whole()
            .filter(|d| *d <= MAX_DECIMALS as u64)
            .map(|d| d as u8)
            .ok_or_else(|| {
                RelayError::InvalidField(format!("decimals must be between 0 and {MAX_DECIMALS}"))
            })?,
        _ => DEFAULT_DECIMALS,
    };

    Ok(TokenCreateRequest {
        name,
        symbol: symbol.to_uppercase(),
        total_supply,
        decimals,
        issuer_wallet,
        issuer_credential,
        distributor_wallet,
        distributor_credential,
        access_token,
    })
}

#[instrument(skip_all)]
pub async fn token_create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TokenCreateBody>, JsonRejection>,
) -> Result<Json<TokenCreateResult>, RelayError> {
    let request = token_request(body(payload)?)?;
    let network = state.config.network;

    info!(
        name = %request.name,
        symbol = %request.symbol,
        total_supply = request.total_supply,
        decimals = request.decimals,
        %network,
        "token creation requested"
    );

    let raw = state
        .provider
        .create_token(&request, network, state.config.token_timeout)
        .await
        .map_err(|e| {
            warn!(error = %e, "token creation failed");
            RelayError::TokenProviderUnavailable(e)
        })?;

    let result = normalize_token_reply(&raw, &request, network).map_err(|e| {
        warn!(error = %e, "token creation reply unusable");
        RelayError::TokenProviderUnavailable(e)
    })?;

    info!(token_id = %result.token_id, symbol = %result.symbol, "token created");
    Ok(Json(result))
}

// ─── Health ──────────────────────────────────────────────────────────────────

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        network: state.config.network.tag().to_string(),
        fallback: state.config.fallback,
    })
}
