use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Secret;

/// Decimals used when the caller does not pick any.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimals value the provider accepts.
pub const MAX_DECIMALS: u8 = 18;

/// Provider network a token is issued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    /// Tag sent to the provider.
    pub fn tag(self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Name shown to users in a [`TokenCreateResult`].
    pub fn display_name(self) -> &'static str {
        match self {
            Network::Testnet => "Pi Testnet",
            Network::Mainnet => "Pi Mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(format!("unknown network {other:?}, expected testnet or mainnet")),
        }
    }
}

/// A validated token issuance request. Credentials are [`Secret`]s so a
/// derived `Debug` never prints them.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenCreateRequest {
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    pub decimals: u8,
    pub issuer_wallet: String,
    pub issuer_credential: Secret,
    pub distributor_wallet: String,
    pub distributor_credential: Secret,
    pub access_token: Secret,
}

/// Provider reply normalized to the shape the client renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreateResult {
    pub success: bool,
    pub token_id: String,
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    pub decimals: u8,
    pub network: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}
