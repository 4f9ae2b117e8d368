//! Top-level controller. Owns the session and every piece of page state, and
//! hands borrowed views of them to the individual flows.

use tracing::info;

use xpaio_common::payment::{PaymentLifecycleRecord, PaymentRequest};
use xpaio_common::session::Session;
use xpaio_common::token::TokenCreateResult;

use crate::auth::AuthFlow;
use crate::chat::{ChatBot, ChatMessage};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::payment::PaymentFlow;
use crate::relay_client::{HttpRelayClient, RelayApi};
use crate::sdk::WalletSdk;
use crate::token_form::TokenForm;

/// What the page shows after a payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReport {
    pub success: bool,
    pub message: String,
    pub payment_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl PaymentReport {
    fn from_outcome(outcome: &Result<PaymentLifecycleRecord, ClientError>) -> Self {
        match outcome {
            Ok(record) => Self {
                success: true,
                message: "Payment completed".to_string(),
                payment_id: Some(record.payment_id.clone()),
                transaction_id: record.transaction_id.clone(),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                payment_id: match e {
                    ClientError::PaymentCancelled { payment_id }
                    | ClientError::PaymentFailed { payment_id, .. }
                    | ClientError::CompletionUnconfirmed { payment_id, .. } => {
                        Some(payment_id.clone())
                    }
                    _ => None,
                },
                transaction_id: None,
            },
        }
    }
}

/// Clears the thinking flag if a reply never arrives.
struct PendingReply<'a>(&'a mut ChatBot);

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.0.is_thinking() {
            self.0.abandon_reply();
        }
    }
}

pub struct App<S, R> {
    pub config: ClientConfig,
    sdk: S,
    relay: R,
    pub session: Session,
    pub chat: ChatBot,
    pub token_form: TokenForm,
    pub last_payment: Option<PaymentReport>,
}

impl<S: WalletSdk> App<S, HttpRelayClient> {
    /// App talking to the relay at `config.relay_url`.
    pub fn connect(config: ClientConfig, sdk: S) -> Self {
        let relay = HttpRelayClient::new(config.relay_url.clone(), config.relay_timeout);
        Self::new(config, sdk, relay)
    }
}

impl<S: WalletSdk, R: RelayApi> App<S, R> {
    pub fn new(config: ClientConfig, sdk: S, relay: R) -> Self {
        let chat = ChatBot::new(&config.welcome_message);
        Self {
            config,
            sdk,
            relay,
            session: Session::new(),
            chat,
            token_form: TokenForm::new(),
            last_payment: None,
        }
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Sign in on page load.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        info!(app = %self.config.app_name, "starting");
        AuthFlow::new(&self.sdk, &self.config)
            .run(&mut self.session)
            .await
    }

    pub async fn retry_auth(&mut self) -> Result<(), ClientError> {
        AuthFlow::new(&self.sdk, &self.config)
            .retry(&mut self.session)
            .await
    }

    /// Pay `amount` (as typed by the user) with `memo`. The outcome is also
    /// kept in [`App::last_payment`].
    pub async fn pay(
        &mut self,
        amount: &str,
        memo: &str,
    ) -> Result<PaymentLifecycleRecord, ClientError> {
        let outcome = match PaymentRequest::parse(amount, memo) {
            Ok(request) => {
                PaymentFlow::new(&self.sdk, &self.relay, &self.config)
                    .run(&self.session, &request)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        self.last_payment = Some(PaymentReport::from_outcome(&outcome));
        outcome
    }

    pub async fn create_token(&mut self) -> Result<TokenCreateResult, ClientError> {
        self.token_form.submit(&self.session, &self.relay).await
    }

    /// Post a chat message and wait for the assistant's reply. Dropping the
    /// future mid-wait leaves the chat ready for the next message.
    pub async fn send_chat(&mut self, input: &str) -> Result<ChatMessage, ClientError> {
        self.chat.submit(&self.session, input)?;
        let mut pending = PendingReply(&mut self.chat);
        tokio::time::sleep(self.config.chat_reply_delay).await;
        let reply = pending.0.reply().clone();
        Ok(reply)
    }
}
