//! Wallet sign-in.
//!
//! Waits for the SDK to be injected, initializes it for the current
//! deployment, then signs the user in under a deadline. Every failure lands
//! in the [`Session`] as a message; [`AuthFlow::retry`] starts over.

use std::time::Duration;

use tracing::{info, warn};

use xpaio_common::session::Session;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::sdk::{SdkConfig, WalletSdk, AUTH_SCOPES};

pub struct AuthFlow<'a, S> {
    sdk: &'a S,
    config: &'a ClientConfig,
}

impl<'a, S: WalletSdk> AuthFlow<'a, S> {
    pub fn new(sdk: &'a S, config: &'a ClientConfig) -> Self {
        Self { sdk, config }
    }

    /// Run the full sign-in sequence, recording the outcome in `session`.
    pub async fn run(&self, session: &mut Session) -> Result<(), ClientError> {
        session.set_status("Initializing wallet...");

        let loaded = wait_for_sdk(
            self.sdk,
            self.config.sdk_poll_interval,
            self.config.sdk_poll_attempts,
        )
        .await;
        if !loaded {
            if self.config.allow_placeholder_session {
                warn!("wallet SDK never loaded, continuing as guest");
                session.continue_as_guest("Wallet SDK unavailable");
                return Ok(());
            }
            return Err(fail(session, ClientError::SdkUnavailable));
        }

        session.set_status("Connecting to wallet...");
        let sdk_config = self.sdk_config();
        info!(sandbox = sdk_config.sandbox, "initializing wallet SDK");
        if let Err(e) = self.sdk.init(&sdk_config).await {
            return Err(fail(session, e.into()));
        }

        session.set_status("Signing in...");
        let on_incomplete = Box::new(|payment: serde_json::Value| {
            let id = payment.get("identifier").and_then(|v| v.as_str()).unwrap_or("unknown");
            warn!(payment_id = id, "found incomplete payment from a previous session");
        });
        let auth = tokio::time::timeout(
            self.config.auth_timeout,
            self.sdk.authenticate(&AUTH_SCOPES, on_incomplete),
        )
        .await;

        match auth {
            Ok(Ok(result)) => {
                info!(user = %result.user.display_name, "wallet sign-in complete");
                session.sign_in(result.access_token, result.user);
                Ok(())
            }
            Ok(Err(e)) => Err(fail(session, e.into())),
            Err(_) => Err(fail(session, ClientError::AuthTimedOut)),
        }
    }

    /// Clear the previous attempt and run again from the SDK wait.
    pub async fn retry(&self, session: &mut Session) -> Result<(), ClientError> {
        session.reset();
        self.run(session).await
    }

    fn sdk_config(&self) -> SdkConfig {
        let sandbox = self.config.is_sandbox();
        SdkConfig {
            version: self.config.sdk_version.clone(),
            sandbox,
            host: (!sandbox).then(|| self.config.page_host.clone()),
        }
    }
}

fn fail(session: &mut Session, error: ClientError) -> ClientError {
    warn!(%error, "wallet sign-in failed");
    session.fail(error.to_string());
    error
}

/// Poll until the SDK reports loaded. Checks once up front and once after
/// each of `attempts` sleeps.
pub async fn wait_for_sdk<S: WalletSdk>(sdk: &S, interval: Duration, attempts: u32) -> bool {
    if sdk.is_loaded() {
        return true;
    }
    for _ in 0..attempts {
        tokio::time::sleep(interval).await;
        if sdk.is_loaded() {
            return true;
        }
    }
    false
}
