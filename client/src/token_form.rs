//! Token issuance form state and submission.

use tracing::{info, warn};

use xpaio_common::relay_api::{NumberLike, TokenCreateBody};
use xpaio_common::session::Session;
use xpaio_common::token::{TokenCreateResult, DEFAULT_DECIMALS, MAX_DECIMALS};
use xpaio_common::Secret;

use crate::error::ClientError;
use crate::relay_client::RelayApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    Name,
    Symbol,
    TotalSupply,
    Decimals,
    IssuerWallet,
    IssuerPassword,
    DistributorWallet,
    DistributorPassword,
}

/// Raw form inputs plus the outcome of the last submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenForm {
    pub name: String,
    pub symbol: String,
    pub total_supply: String,
    pub decimals: String,
    pub issuer_wallet: String,
    pub issuer_password: Secret,
    pub distributor_wallet: String,
    pub distributor_password: Secret,
    pub error: Option<String>,
    pub created: Option<TokenCreateResult>,
}

impl Default for TokenForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenForm {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            total_supply: String::new(),
            decimals: DEFAULT_DECIMALS.to_string(),
            issuer_wallet: String::new(),
            issuer_password: Secret::default(),
            distributor_wallet: String::new(),
            distributor_password: Secret::default(),
            error: None,
            created: None,
        }
    }

    /// Update one input. Any edit clears the previous outcome.
    pub fn set(&mut self, field: TokenField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TokenField::Name => self.name = value,
            TokenField::Symbol => self.symbol = value,
            TokenField::TotalSupply => self.total_supply = value,
            TokenField::Decimals => self.decimals = value,
            TokenField::IssuerWallet => self.issuer_wallet = value,
            TokenField::IssuerPassword => self.issuer_password = Secret::new(value),
            TokenField::DistributorWallet => self.distributor_wallet = value,
            TokenField::DistributorPassword => self.distributor_password = Secret::new(value),
        }
        self.error = None;
        self.created = None;
    }

    /// Relay request body for the current inputs. Required-field checks are
    /// the relay's job; only numeric parsing happens here. Blank decimals
    /// fall back to the default.
    pub fn body(&self, access_token: &Secret) -> Result<TokenCreateBody, ClientError> {
        let total_supply = match self.total_supply.trim() {
            "" => None,
            raw => Some(NumberLike::Int(raw.parse::<u64>().map_err(|_| {
                ClientError::InvalidInput("total supply must be a whole number".into())
            })?)),
        };
        let decimals = match self.decimals.trim() {
            "" => DEFAULT_DECIMALS,
            raw => raw
                .parse::<u8>()
                .ok()
                .filter(|d| *d <= MAX_DECIMALS)
                .ok_or_else(|| {
                    ClientError::InvalidInput(format!(
                        "decimals must be between 0 and {MAX_DECIMALS}"
                    ))
                })?,
        };

        Ok(TokenCreateBody {
            name: Some(self.name.trim().to_string()),
            symbol: Some(self.symbol.trim().to_uppercase()),
            total_supply,
            decimals: Some(NumberLike::Int(decimals.into())),
            access_token: Some(access_token.clone()),
            issuer_wallet: Some(self.issuer_wallet.trim().to_string()),
            issuer_password: Some(self.issuer_password.clone()),
            distributor_wallet: Some(self.distributor_wallet.trim().to_string()),
            distributor_password: Some(self.distributor_password.clone()),
        })
    }

    /// Send the form to the relay. On success the result is kept and the
    /// inputs are cleared; on failure the inputs stay for another try.
    pub async fn submit<R: RelayApi>(
        &mut self,
        session: &Session,
        relay: &R,
    ) -> Result<TokenCreateResult, ClientError> {
        self.error = None;
        self.created = None;

        let outcome = match session.usable_token() {
            None => Err(ClientError::NotAuthenticated),
            Some(token) => match self.body(token) {
                Ok(body) => relay.create_token(&body).await.map_err(ClientError::from),
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(result) => {
                info!(token_id = %result.token_id, symbol = %result.symbol, "token issued");
                *self = Self::new();
                self.created = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "token issuance failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
