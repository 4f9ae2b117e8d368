use xpaio_common::payment::PaymentRequestError;

use crate::relay_client::RelayClientError;
use crate::sdk::SdkError;

/// Everything a user-triggered action can fail with. All of these are
/// recoverable: the UI shows the message and offers a retry.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("wallet SDK is unavailable")]
    SdkUnavailable,
    #[error("wallet sign-in timed out")]
    AuthTimedOut,
    #[error("wallet SDK error: {0}")]
    Sdk(#[from] SdkError),
    #[error("sign in with your wallet first")]
    NotAuthenticated,
    #[error(transparent)]
    InvalidPayment(#[from] PaymentRequestError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("payment was cancelled")]
    PaymentCancelled { payment_id: String },
    #[error("payment failed: {reason}")]
    PaymentFailed { payment_id: String, reason: String },
    #[error("payment {payment_id} was not confirmed by the server: {reason}")]
    CompletionUnconfirmed { payment_id: String, reason: String },
    #[error(transparent)]
    Relay(#[from] RelayClientError),
}
