//! JSON bodies exchanged between the client and the relay service.
//!
//! Request fields are all optional on the wire so the relay can answer a
//! missing field with its own 400 message instead of a parse failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Secret;

pub const APPROVE_PATH: &str = "/api/payment/approve";
pub const COMPLETE_PATH: &str = "/api/payment/complete";
pub const TOKEN_CREATE_PATH: &str = "/api/token/create";
pub const HEALTH_PATH: &str = "/health";

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    pub payment_id: Option<String>,
    pub access_token: Option<Secret>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
    pub payment_id: Option<String>,
    pub txid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreateBody {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<NumberLike>,
    pub decimals: Option<NumberLike>,
    pub access_token: Option<Secret>,
    pub issuer_wallet: Option<String>,
    pub issuer_password: Option<Secret>,
    pub distributor_wallet: Option<String>,
    pub distributor_password: Option<Secret>,
}

/// A numeric field that forms may send as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Int(u64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    /// The value as a non-negative whole number, if it is one.
    pub fn as_whole(&self) -> Option<u64> {
        match self {
            NumberLike::Int(v) => Some(*v),
            NumberLike::Float(f) => whole_from_f64(*f),
            NumberLike::Text(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_from_f64))
            }
        }
    }

    /// True for an empty string, which forms send for untouched inputs.
    pub fn is_blank(&self) -> bool {
        matches!(self, NumberLike::Text(s) if s.trim().is_empty())
    }
}

impl From<u64> for NumberLike {
    fn from(value: u64) -> Self {
        NumberLike::Int(value)
    }
}

fn whole_from_f64(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// Reply of the approve and complete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRelayResponse {
    pub success: bool,
    pub payment: Value,
    /// Set when the provider could not be reached and the relay answered
    /// from its sandbox fallback instead.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub network: String,
    pub fallback: bool,
}
