use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xpaio_common::token::Network;
use xpaio_common::Secret;
use xpaio_relay::config::{RelayConfig, DEFAULT_PORT, DEFAULT_PROVIDER_URL};
use xpaio_relay::AppState;

#[derive(Parser)]
#[command(name = "xpaio-relay", about = "Xpaio payment and token relay")]
struct Cli {
    /// HTTP port to listen on.
    #[arg(long, env = "XPAIO_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Payment provider base URL.
    #[arg(long, env = "XPAIO_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    provider_url: String,

    /// Server-side provider API key.
    #[arg(long, env = "XPAIO_PROVIDER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Provider network for token issuance (testnet or mainnet).
    #[arg(long, env = "XPAIO_NETWORK", default_value = "testnet")]
    network: Network,

    /// Answer approve/complete with a synthetic success when the provider
    /// fails. Sandbox only.
    #[arg(long, env = "XPAIO_RELAY_FALLBACK")]
    fallback: bool,

    /// Approve call timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    approve_timeout_ms: u64,

    /// Complete call timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    complete_timeout_ms: u64,

    /// Token-create call timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    token_timeout_ms: u64,
}

impl Cli {
    fn into_config(self) -> RelayConfig {
        let mut config = RelayConfig::new(self.provider_url, Secret::new(self.api_key));
        config.network = self.network;
        config.fallback = self.fallback;
        config.approve_timeout = Duration::from_millis(self.approve_timeout_ms);
        config.complete_timeout = Duration::from_millis(self.complete_timeout_ms);
        config.token_timeout = Duration::from_millis(self.token_timeout_ms);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let port = cli.port;
    let config = cli.into_config();
    config.validate().map_err(|e| anyhow!(e))?;

    if config.fallback {
        warn!("provider fallback enabled: approve/complete failures are answered with synthetic success");
    }

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        provider = %config.provider_url,
        network = %config.network,
        "relay listening"
    );

    xpaio_relay::serve(listener, Arc::new(AppState::new(config)))
        .await
        .context("relay server failed")
}
