//! Seam for the browser-injected wallet SDK.
//!
//! The SDK itself is an external collaborator. Hosts implement
//! [`WalletSdk`] over whatever binding they have; tests script it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use xpaio_common::session::WalletUser;
use xpaio_common::Secret;

/// Scopes requested at sign-in: identity and payment capability.
pub const AUTH_SCOPES: [&str; 2] = ["username", "payments"];

/// Arguments for `init`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdkConfig {
    pub version: String,
    pub sandbox: bool,
    /// Production host identifier; only set outside the sandbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub access_token: Secret,
    pub user: WalletUser,
}

/// A payment left unfinished by an earlier session, as reported by the SDK.
pub type IncompletePayment = Value;

pub type IncompletePaymentHandler = Box<dyn Fn(IncompletePayment) + Send + Sync>;

/// Arguments for `createPayment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDetails {
    pub amount: f64,
    pub memo: String,
    pub metadata: Map<String, Value>,
}

/// SDK lifecycle callbacks, delivered in the order the SDK fires them.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkPaymentEvent {
    ReadyForServerApproval { payment_id: String },
    ReadyForServerCompletion { payment_id: String, txid: String },
    Cancelled { payment_id: String },
    Error {
        message: String,
        payment_id: Option<String>,
    },
}

/// A payment the SDK has accepted. Events stop when the sender is dropped.
#[derive(Debug)]
pub struct PaymentSession {
    pub identifier: String,
    pub events: mpsc::Receiver<SdkPaymentEvent>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkError {
    #[error("init failed: {0}")]
    Init(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("payment could not be created: {0}")]
    Payment(String),
}

/// The wallet SDK as the flows see it.
#[allow(async_fn_in_trait)]
pub trait WalletSdk {
    /// True once the SDK has been injected into the page.
    fn is_loaded(&self) -> bool;

    async fn init(&self, config: &SdkConfig) -> Result<(), SdkError>;

    /// Sign the user in. `on_incomplete` is called for any payment a previous
    /// session left unfinished.
    async fn authenticate(
        &self,
        scopes: &[&str],
        on_incomplete: IncompletePaymentHandler,
    ) -> Result<AuthResult, SdkError>;

    async fn create_payment(&self, details: &PaymentDetails) -> Result<PaymentSession, SdkError>;
}
