//! Scripted collaborators for tests: a wallet SDK whose behavior is set up
//! front, and a relay that records every call.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use xpaio_common::relay_api::{PaymentRelayResponse, TokenCreateBody};
use xpaio_common::session::WalletUser;
use xpaio_common::token::TokenCreateResult;
use xpaio_common::Secret;

use crate::relay_client::{RelayApi, RelayClientError};
use crate::sdk::{
    AuthResult, IncompletePaymentHandler, PaymentDetails, PaymentSession, SdkConfig, SdkError,
    SdkPaymentEvent, WalletSdk,
};

// ─── ScriptedSdk ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum AuthBehavior {
    Succeed(AuthResult),
    Fail(SdkError),
    /// Never resolves; exercises the sign-in timeout.
    Hang,
}

pub struct ScriptedSdk {
    /// `None` never loads; `Some(n)` reports loaded from the n-th poll on.
    load_after_polls: Mutex<Option<u32>>,
    polls: AtomicU32,
    init_error: Mutex<Option<SdkError>>,
    auth: Mutex<AuthBehavior>,
    incomplete: Vec<Value>,
    payment: Mutex<Option<(String, Vec<SdkPaymentEvent>)>>,
    /// Senders kept alive so the payment stream stays open after the
    /// scripted events.
    held_open: Mutex<Option<Vec<mpsc::Sender<SdkPaymentEvent>>>>,
    pub init_calls: Mutex<Vec<SdkConfig>>,
    pub auth_calls: AtomicU32,
    pub created: Mutex<Vec<PaymentDetails>>,
}

impl ScriptedSdk {
    /// Loads immediately and signs in as `user` with `token`.
    pub fn signed_in(token: &str, user: &str) -> Self {
        Self {
            load_after_polls: Mutex::new(Some(0)),
            polls: AtomicU32::new(0),
            init_error: Mutex::new(None),
            auth: Mutex::new(AuthBehavior::Succeed(AuthResult {
                access_token: Secret::new(token),
                user: WalletUser {
                    id: format!("uid-{user}"),
                    display_name: user.to_string(),
                },
            })),
            incomplete: Vec::new(),
            payment: Mutex::new(None),
            held_open: Mutex::new(None),
            init_calls: Mutex::new(Vec::new()),
            auth_calls: AtomicU32::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn never_loads(self) -> Self {
        *self.load_after_polls.lock().unwrap() = None;
        self
    }

    pub fn loads_after(self, polls: u32) -> Self {
        *self.load_after_polls.lock().unwrap() = Some(polls);
        self
    }

    pub fn with_auth(self, behavior: AuthBehavior) -> Self {
        *self.auth.lock().unwrap() = behavior;
        self
    }

    pub fn with_init_error(self, error: SdkError) -> Self {
        *self.init_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_incomplete_payment(mut self, payment: Value) -> Self {
        self.incomplete.push(payment);
        self
    }

    /// The next `create_payment` returns `payment_id` and replays `events`.
    pub fn with_payment(self, payment_id: &str, events: Vec<SdkPaymentEvent>) -> Self {
        *self.payment.lock().unwrap() = Some((payment_id.to_string(), events));
        self
    }

    /// Keep the payment stream open after the scripted events, like a wallet
    /// that goes quiet without closing.
    pub fn keep_payment_open(self) -> Self {
        *self.held_open.lock().unwrap() = Some(Vec::new());
        self
    }

    /// Make the SDK show up on the next poll.
    pub fn make_available(&self) {
        self.polls.store(0, Ordering::SeqCst);
        *self.load_after_polls.lock().unwrap() = Some(0);
    }

    pub fn set_auth(&self, behavior: AuthBehavior) {
        *self.auth.lock().unwrap() = behavior;
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

/// Events for a payment that goes through every SDK callback.
pub fn happy_events(payment_id: &str, txid: &str) -> Vec<SdkPaymentEvent> {
    vec![
        SdkPaymentEvent::ReadyForServerApproval {
            payment_id: payment_id.to_string(),
        },
        SdkPaymentEvent::ReadyForServerCompletion {
            payment_id: payment_id.to_string(),
            txid: txid.to_string(),
        },
    ]
}

impl WalletSdk for ScriptedSdk {
    fn is_loaded(&self) -> bool {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        matches!(*self.load_after_polls.lock().unwrap(), Some(n) if seen >= n)
    }

    async fn init(&self, config: &SdkConfig) -> Result<(), SdkError> {
        self.init_calls.lock().unwrap().push(config.clone());
        match self.init_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn authenticate(
        &self,
        scopes: &[&str],
        on_incomplete: IncompletePaymentHandler,
    ) -> Result<AuthResult, SdkError> {
        assert_eq!(scopes, ["username", "payments"]);
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        for payment in &self.incomplete {
            on_incomplete(payment.clone());
        }
        let behavior = self.auth.lock().unwrap().clone();
        match behavior {
            AuthBehavior::Succeed(result) => Ok(result),
            AuthBehavior::Fail(e) => Err(e),
            AuthBehavior::Hang => std::future::pending().await,
        }
    }

    async fn create_payment(&self, details: &PaymentDetails) -> Result<PaymentSession, SdkError> {
        self.created.lock().unwrap().push(details.clone());
        let (identifier, events) = self
            .payment
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SdkError::Payment("no payment scripted".into()))?;
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event)
                .map_err(|e| SdkError::Payment(e.to_string()))?;
        }
        if let Some(held) = self.held_open.lock().unwrap().as_mut() {
            held.push(tx);
        }
        Ok(PaymentSession {
            identifier,
            events: rx,
        })
    }
}

// ─── RecordingRelay ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RelayCall {
    Approve {
        payment_id: String,
        access_token: String,
    },
    Complete {
        payment_id: String,
        txid: String,
    },
    /// The body as it would go over the wire.
    CreateToken(Value),
}

#[derive(Default)]
pub struct RecordingRelay {
    pub calls: Mutex<Vec<RelayCall>>,
    pub fail_approve: bool,
    pub fail_complete: bool,
    pub fail_token: bool,
}

impl RecordingRelay {
    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn unavailable() -> RelayClientError {
        RelayClientError::Status {
            status: 503,
            message: "provider unavailable".into(),
        }
    }
}

impl RelayApi for RecordingRelay {
    async fn approve_payment(
        &self,
        payment_id: &str,
        access_token: &Secret,
    ) -> Result<PaymentRelayResponse, RelayClientError> {
        self.calls.lock().unwrap().push(RelayCall::Approve {
            payment_id: payment_id.to_string(),
            access_token: access_token.expose().to_string(),
        });
        if self.fail_approve {
            return Err(Self::unavailable());
        }
        Ok(PaymentRelayResponse {
            success: true,
            payment: json!({ "identifier": payment_id, "status": "approved" }),
            synthetic: false,
        })
    }

    async fn complete_payment(
        &self,
        payment_id: &str,
        txid: &str,
    ) -> Result<PaymentRelayResponse, RelayClientError> {
        self.calls.lock().unwrap().push(RelayCall::Complete {
            payment_id: payment_id.to_string(),
            txid: txid.to_string(),
        });
        if self.fail_complete {
            return Err(Self::unavailable());
        }
        Ok(PaymentRelayResponse {
            success: true,
            payment: json!({ "identifier": payment_id, "txid": txid, "status": "completed" }),
            synthetic: false,
        })
    }

    async fn create_token(
        &self,
        body: &TokenCreateBody,
    ) -> Result<TokenCreateResult, RelayClientError> {
        let wire = serde_json::to_value(body).map_err(|e| RelayClientError::Decode(e.to_string()))?;
        self.calls.lock().unwrap().push(RelayCall::CreateToken(wire));
        if self.fail_token {
            return Err(Self::unavailable());
        }
        Ok(TokenCreateResult {
            success: true,
            token_id: "tok-1".into(),
            name: body.name.clone().unwrap_or_default(),
            symbol: body.symbol.clone().unwrap_or_default(),
            total_supply: body
                .total_supply
                .as_ref()
                .and_then(|n| n.as_whole())
                .unwrap_or_default(),
            decimals: 18,
            network: "Pi Testnet".into(),
            created_at: Utc::now(),
            contract_address: None,
            transaction_hash: None,
        })
    }
}
