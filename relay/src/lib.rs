//! Xpaio relay service.
//!
//! Forwards payment approval/completion and token issuance requests from the
//! client to the payment provider, holding the provider API key server-side.
//! With `fallback` enabled (sandbox only), provider failures on approve and
//! complete are answered with a synthetic success so the client flow is not
//! blocked; token creation never falls back.

pub mod config;
pub mod error;
pub mod handlers;
pub mod provider;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use xpaio_common::relay_api::{APPROVE_PATH, COMPLETE_PATH, HEALTH_PATH, TOKEN_CREATE_PATH};

use crate::config::RelayConfig;
use crate::provider::ProviderClient;

pub struct AppState {
    pub config: RelayConfig,
    pub provider: ProviderClient,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        let provider = ProviderClient::new(config.provider_url.clone(), config.api_key.clone());
        Self { config, provider }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(APPROVE_PATH, post(handlers::approve_handler))
        .route(COMPLETE_PATH, post(handlers::complete_handler))
        .route(TOKEN_CREATE_PATH, post(handlers::token_create_handler))
        .route(HEALTH_PATH, get(handlers::health_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the relay on an already-bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
