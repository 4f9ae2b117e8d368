use std::time::Duration;

use xpaio_common::token::Network;
use xpaio_common::Secret;

pub const DEFAULT_PROVIDER_URL: &str = "https://api.minepi.com";
pub const DEFAULT_PORT: u16 = 3000;

/// Relay service settings.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Base URL of the payment provider API (without the `/v2` prefix).
    pub provider_url: String,
    /// Server-held provider API key.
    pub api_key: Secret,
    pub network: Network,
    /// Answer approve/complete with a synthetic success when the provider
    /// fails. Sandbox deployments only; off unless explicitly enabled.
    pub fallback: bool,
    pub approve_timeout: Duration,
    pub complete_timeout: Duration,
    pub token_timeout: Duration,
}

impl RelayConfig {
    pub fn new(provider_url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            provider_url: provider_url.into(),
            api_key,
            network: Network::Testnet,
            fallback: false,
            approve_timeout: Duration::from_secs(5),
            complete_timeout: Duration::from_secs(10),
            token_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Apply one timeout to every outbound call.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.approve_timeout = timeout;
        self.complete_timeout = timeout;
        self.token_timeout = timeout;
        self
    }

    /// Fallback answers fabricate provider state, which is only tolerable
    /// where no real value moves.
    pub fn validate(&self) -> Result<(), String> {
        if self.fallback && self.network == Network::Mainnet {
            return Err("provider fallback cannot be enabled on mainnet".to_string());
        }
        if self.api_key.is_blank() {
            return Err("provider API key is empty".to_string());
        }
        Ok(())
    }
}
