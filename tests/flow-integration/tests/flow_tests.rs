//! Client flows driven by a scripted wallet against a real relay.

use std::time::Duration;

use xpaio_client::error::ClientError;
use xpaio_client::relay_client::HttpRelayClient;
use xpaio_client::testing::{happy_events, ScriptedSdk};
use xpaio_client::token_form::TokenField;
use xpaio_client::{App, ClientConfig};
use xpaio_common::payment::PaymentState;
use xpaio_flow_integration::{relay_config, spawn_relay, MockProvider, ProviderBehavior};

async fn app_against(relay: String, sdk: ScriptedSdk) -> App<ScriptedSdk, HttpRelayClient> {
    let config = ClientConfig {
        relay_url: relay,
        relay_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    };
    let mut app = App::connect(config, sdk);
    app.start().await.unwrap();
    app
}

#[tokio::test]
async fn payment_completes_through_relay_and_provider() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;
    let sdk = ScriptedSdk::signed_in("user-token", "alice")
        .with_payment("pay-e2e", happy_events("pay-e2e", "tx-e2e"));
    let mut app = app_against(relay, sdk).await;

    let record = app.pay("0.1", "test").await.unwrap();

    assert_eq!(record.state(), PaymentState::Completed);
    assert_eq!(record.transaction_id.as_deref(), Some("tx-e2e"));
    assert!(app.last_payment.as_ref().unwrap().success);

    let paths: Vec<String> = provider.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/v2/payments/pay-e2e/approve",
            "/v2/payments/pay-e2e/complete"
        ]
    );

    let created = app.sdk().created.lock().unwrap();
    assert_eq!(created[0].amount, 0.1);
    assert_eq!(created[0].memo, "test");
}

#[tokio::test]
async fn provider_outage_fails_payment_without_fallback() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider)).await;
    let sdk = ScriptedSdk::signed_in("user-token", "alice")
        .with_payment("pay-x", happy_events("pay-x", "tx-x"));
    let mut app = app_against(relay, sdk).await;

    let err = app.pay("1", "m").await.unwrap_err();

    assert!(matches!(err, ClientError::CompletionUnconfirmed { .. }));
    let report = app.last_payment.as_ref().unwrap();
    assert!(!report.success);
    assert_eq!(report.payment_id.as_deref(), Some("pay-x"));
}

#[tokio::test]
async fn sandbox_fallback_lets_payment_finish() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;
    let sdk = ScriptedSdk::signed_in("user-token", "alice")
        .with_payment("pay-s", happy_events("pay-s", "tx-s"));
    let mut app = app_against(relay, sdk).await;

    let record = app.pay("1", "m").await.unwrap();
    assert_eq!(record.state(), PaymentState::Completed);
}

#[tokio::test]
async fn token_form_issues_token() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;
    let mut app = app_against(relay, ScriptedSdk::signed_in("user-token", "alice")).await;

    let form = &mut app.token_form;
    form.set(TokenField::Name, "Alice Coin");
    form.set(TokenField::Symbol, "alc");
    form.set(TokenField::TotalSupply, "21000000");
    form.set(TokenField::Decimals, "");
    form.set(TokenField::IssuerWallet, "GISSUER");
    form.set(TokenField::IssuerPassword, "issuer-secret");
    form.set(TokenField::DistributorWallet, "GDIST");
    form.set(TokenField::DistributorPassword, "dist-secret");

    let result = app.create_token().await.unwrap();

    assert_eq!(result.token_id, "tok-abc");
    assert_eq!(result.symbol, "ALC");
    assert_eq!(result.decimals, 18);
    assert_eq!(result.total_supply, 21_000_000);
    assert_eq!(app.token_form.created.as_ref(), Some(&result));
    assert!(app.token_form.name.is_empty());

    let sent = &provider.requests()[0];
    assert_eq!(sent.authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(sent.body["total_supply"], "21000000");
}

#[tokio::test]
async fn token_outage_keeps_form_and_reports() {
    let provider = MockProvider::start(ProviderBehavior::Hang).await;
    let relay = spawn_relay(relay_config(&provider)).await;
    let mut app = app_against(relay, ScriptedSdk::signed_in("user-token", "alice")).await;

    app.token_form.set(TokenField::Name, "Alice Coin");
    app.token_form.set(TokenField::Symbol, "alc");
    app.token_form.set(TokenField::TotalSupply, "100");
    app.token_form.set(TokenField::IssuerWallet, "GISSUER");
    app.token_form.set(TokenField::IssuerPassword, "issuer-secret");
    app.token_form.set(TokenField::DistributorWallet, "GDIST");
    app.token_form.set(TokenField::DistributorPassword, "dist-secret");

    let err = app.create_token().await.unwrap_err();

    assert!(matches!(err, ClientError::Relay(_)));
    assert_eq!(app.token_form.name, "Alice Coin");
    assert!(app.token_form.created.is_none());
    assert_eq!(
        app.token_form.error.as_deref(),
        Some("token issuance provider is unavailable")
    );
}
