//! One payment attempt, from `createPayment` to server-confirmed completion.
//!
//! SDK callbacks arrive as [`SdkPaymentEvent`]s and drive a
//! [`PaymentLifecycleRecord`]. Relay calls are made on the approval and
//! completion events. A payment only counts as successful once the relay
//! confirms completion; an approval relay failure is logged and the flow
//! keeps waiting for the wallet.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use xpaio_common::payment::{PaymentEvent, PaymentLifecycleRecord, PaymentRequest};
use xpaio_common::session::Session;
use xpaio_common::Secret;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::relay_client::RelayApi;
use crate::sdk::{PaymentDetails, SdkPaymentEvent, WalletSdk};

pub struct PaymentFlow<'a, S, R> {
    sdk: &'a S,
    relay: &'a R,
    config: &'a ClientConfig,
}

impl<'a, S: WalletSdk, R: RelayApi> PaymentFlow<'a, S, R> {
    pub fn new(sdk: &'a S, relay: &'a R, config: &'a ClientConfig) -> Self {
        Self { sdk, relay, config }
    }

    /// Drive one payment to a terminal state. Returns the completed record,
    /// or the reason the payment did not complete.
    pub async fn run(
        &self,
        session: &Session,
        request: &PaymentRequest,
    ) -> Result<PaymentLifecycleRecord, ClientError> {
        let token = session.usable_token().ok_or(ClientError::NotAuthenticated)?;
        request.validate()?;

        let details = self.details(request);
        let created = self.sdk.create_payment(&details).await?;
        let mut events = created.events;
        let mut record = PaymentLifecycleRecord::new(created.identifier);
        info!(payment_id = %record.payment_id, amount = request.amount, "payment created");

        loop {
            let next = tokio::time::timeout(self.config.payment_event_timeout, events.recv());
            let event = match next.await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(_) => {
                    let reason = "wallet did not respond in time".to_string();
                    return Err(abandon(record, reason));
                }
            };
            match event {
                SdkPaymentEvent::ReadyForServerApproval { payment_id } => {
                    if !matches_record(&record, &payment_id)
                        || !advance(&mut record, PaymentEvent::ReadyForApproval)
                    {
                        continue;
                    }
                    self.approve(&mut record, token).await;
                }
                SdkPaymentEvent::ReadyForServerCompletion { payment_id, txid } => {
                    if !matches_record(&record, &payment_id)
                        || !advance(
                            &mut record,
                            PaymentEvent::ReadyForCompletion {
                                transaction_id: txid.clone(),
                            },
                        )
                    {
                        continue;
                    }
                    return self.complete(record, &txid).await;
                }
                SdkPaymentEvent::Cancelled { payment_id } => {
                    if !matches_record(&record, &payment_id)
                        || !advance(&mut record, PaymentEvent::Cancelled)
                    {
                        continue;
                    }
                    info!(%payment_id, "payment cancelled in wallet");
                    return Err(ClientError::PaymentCancelled { payment_id });
                }
                SdkPaymentEvent::Error {
                    message,
                    payment_id,
                } => {
                    if let Some(id) = &payment_id {
                        if !matches_record(&record, id) {
                            continue;
                        }
                    }
                    if !advance(
                        &mut record,
                        PaymentEvent::Failed {
                            reason: message.clone(),
                        },
                    ) {
                        continue;
                    }
                    warn!(payment_id = %record.payment_id, %message, "wallet reported payment error");
                    return Err(ClientError::PaymentFailed {
                        payment_id: record.payment_id,
                        reason: message,
                    });
                }
            }
        }

        Err(abandon(
            record,
            "wallet stopped reporting before the payment finished".to_string(),
        ))
    }

    /// SDK arguments: the request plus app id and a millisecond timestamp
    /// for tracing.
    pub fn details(&self, request: &PaymentRequest) -> PaymentDetails {
        let mut metadata = request.metadata.clone();
        metadata.insert("appId".into(), Value::String(self.config.app_id.clone()));
        metadata.insert("timestamp".into(), Utc::now().timestamp_millis().into());
        PaymentDetails {
            amount: request.amount,
            memo: request.memo.clone(),
            metadata,
        }
    }

    async fn approve(&self, record: &mut PaymentLifecycleRecord, token: &Secret) {
        match self.relay.approve_payment(&record.payment_id, token).await {
            Ok(resp) => {
                if resp.synthetic {
                    warn!(payment_id = %record.payment_id, "approval answered by relay fallback");
                }
                advance(record, PaymentEvent::ServerApproved);
            }
            Err(e) => {
                warn!(payment_id = %record.payment_id, error = %e, "approval relay failed, waiting for wallet");
            }
        }
    }

    async fn complete(
        &self,
        mut record: PaymentLifecycleRecord,
        txid: &str,
    ) -> Result<PaymentLifecycleRecord, ClientError> {
        match self.relay.complete_payment(&record.payment_id, txid).await {
            Ok(resp) => {
                if resp.synthetic {
                    warn!(payment_id = %record.payment_id, "completion answered by relay fallback");
                }
                advance(&mut record, PaymentEvent::ServerCompleted);
                info!(payment_id = %record.payment_id, %txid, "payment completed");
                Ok(record)
            }
            Err(e) => {
                let reason = e.to_string();
                advance(
                    &mut record,
                    PaymentEvent::Failed {
                        reason: reason.clone(),
                    },
                );
                warn!(payment_id = %record.payment_id, error = %e, "completion not confirmed");
                Err(ClientError::CompletionUnconfirmed {
                    payment_id: record.payment_id,
                    reason,
                })
            }
        }
    }
}

fn matches_record(record: &PaymentLifecycleRecord, payment_id: &str) -> bool {
    if record.payment_id == payment_id {
        return true;
    }
    warn!(
        expected = %record.payment_id,
        got = %payment_id,
        "ignoring wallet event for another payment"
    );
    false
}

/// Fail a payment the wallet stopped driving.
fn abandon(mut record: PaymentLifecycleRecord, reason: String) -> ClientError {
    advance(
        &mut record,
        PaymentEvent::Failed {
            reason: reason.clone(),
        },
    );
    warn!(payment_id = %record.payment_id, "{reason}");
    ClientError::PaymentFailed {
        payment_id: record.payment_id,
        reason,
    }
}

/// Apply `event`, logging and ignoring it if the current state rejects it.
fn advance(record: &mut PaymentLifecycleRecord, event: PaymentEvent) -> bool {
    match record.apply(event) {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "ignoring out-of-order wallet event");
            false
        }
    }
}
