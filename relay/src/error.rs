use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use xpaio_common::relay_api::ErrorResponse;

use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    InvalidField(String),
    #[error("malformed request body: {0}")]
    BadBody(String),
    #[error("payment provider call failed")]
    Provider(#[source] ProviderError),
    #[error("token issuance provider is unavailable")]
    TokenProviderUnavailable(#[source] ProviderError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingFields(_) | RelayError::InvalidField(_) | RelayError::BadBody(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Provider(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Provider(_) => StatusCode::BAD_GATEWAY,
            RelayError::TokenProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let details = match &self {
            RelayError::Provider(e) | RelayError::TokenProviderUnavailable(e) => Some(e.to_string()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}
