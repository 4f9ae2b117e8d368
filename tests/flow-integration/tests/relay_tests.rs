//! Relay endpoints against a mock provider over real HTTP.

use axum::http::StatusCode;
use serde_json::{json, Value};

use xpaio_common::relay_api::{APPROVE_PATH, COMPLETE_PATH, HEALTH_PATH, TOKEN_CREATE_PATH};
use xpaio_flow_integration::{
    post, relay_config, spawn_relay, MockProvider, ProviderBehavior, TEST_API_KEY,
};

fn token_body() -> Value {
    json!({
        "name": "Test Coin",
        "symbol": "tcn",
        "totalSupply": "1000",
        "accessToken": "user-token",
        "issuerWallet": "GISSUER",
        "issuerPassword": "issuer-secret",
        "distributorWallet": "GDIST",
        "distributorPassword": "dist-secret",
    })
}

// ─── Approve / complete ──────────────────────────────────────────────────────

#[tokio::test]
async fn approve_forwards_with_server_key() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let (status, reply) = post(
        &relay,
        APPROVE_PATH,
        &json!({ "paymentId": "pay-1", "accessToken": "user-token" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["payment"]["identifier"], "pay-1");
    assert!(reply.get("synthetic").is_none());

    let seen = provider.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/v2/payments/pay-1/approve");
    assert_eq!(
        seen[0].authorization.as_deref(),
        Some(format!("Key {TEST_API_KEY}").as_str())
    );
}

#[tokio::test]
async fn complete_forwards_txid() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let (status, reply) = post(
        &relay,
        COMPLETE_PATH,
        &json!({ "paymentId": "pay-2", "txid": "tx-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["payment"]["transaction"]["txid"], "tx-2");
    let seen = provider.requests();
    assert_eq!(seen[0].path, "/v2/payments/pay-2/complete");
    assert_eq!(seen[0].body, json!({ "txid": "tx-2" }));
}

#[tokio::test]
async fn missing_fields_never_reach_provider() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;

    let (status, reply) = post(&relay, APPROVE_PATH, &json!({ "paymentId": "pay-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].as_str().unwrap().contains("accessToken"));

    let (status, reply) = post(&relay, COMPLETE_PATH, &json!({ "paymentId": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = reply["error"].as_str().unwrap();
    assert!(message.contains("paymentId") && message.contains("txid"));

    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let resp = reqwest::Client::new()
        .post(format!("{relay}{APPROVE_PATH}"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn fallback_answers_with_synthetic_success() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;

    let (status, reply) = post(
        &relay,
        APPROVE_PATH,
        &json!({ "paymentId": "pay-3", "accessToken": "user-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["synthetic"], true);
    assert_eq!(reply["payment"]["identifier"], "pay-3");

    let (status, reply) = post(
        &relay,
        COMPLETE_PATH,
        &json!({ "paymentId": "pay-3", "txid": "tx-3" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["synthetic"], true);
    assert_eq!(reply["payment"]["txid"], "tx-3");

    // The provider was still tried first.
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn fallback_covers_provider_timeout() {
    let provider = MockProvider::start(ProviderBehavior::Hang).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;

    let (status, reply) = post(
        &relay,
        APPROVE_PATH,
        &json!({ "paymentId": "pay-slow", "accessToken": "user-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["synthetic"], true);
    assert_eq!(reply["payment"]["identifier"], "pay-slow");

    let (status, reply) = post(
        &relay,
        COMPLETE_PATH,
        &json!({ "paymentId": "pay-slow", "txid": "tx-slow" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["synthetic"], true);
    assert_eq!(reply["payment"]["identifier"], "pay-slow");
    assert_eq!(reply["payment"]["txid"], "tx-slow");
}

#[tokio::test]
async fn provider_failure_without_fallback_is_a_gateway_error() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let (status, reply) = post(
        &relay,
        APPROVE_PATH,
        &json!({ "paymentId": "pay-4", "accessToken": "user-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(reply["details"]
        .as_str()
        .unwrap()
        .contains("provider exploded"));

    provider.set_behavior(ProviderBehavior::Hang);
    let (status, _) = post(
        &relay,
        COMPLETE_PATH,
        &json!({ "paymentId": "pay-4", "txid": "tx-4" }),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn concurrent_approvals_are_independent() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let bodies: Vec<Value> = (0..8)
        .map(|i| json!({ "paymentId": format!("pay-{i}"), "accessToken": "user-token" }))
        .collect();
    let replies =
        futures::future::join_all(bodies.iter().map(|b| post(&relay, APPROVE_PATH, b))).await;

    for (i, (status, reply)) in replies.iter().enumerate() {
        assert_eq!(*status, StatusCode::OK);
        assert_eq!(reply["payment"]["identifier"], format!("pay-{i}"));
    }
    assert_eq!(provider.requests().len(), 8);
}

// ─── Token create ────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_create_fills_defaults_and_normalizes_reply() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let (status, reply) = post(&relay, TOKEN_CREATE_PATH, &token_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["tokenId"], "tok-abc");
    assert_eq!(reply["symbol"], "TCN");
    assert_eq!(reply["totalSupply"], 1000);
    assert_eq!(reply["decimals"], 18);
    assert_eq!(reply["network"], "Pi Testnet");
    assert_eq!(reply["contractAddress"], "GCONTRACT");
    assert_eq!(reply["transactionHash"], "hash-1");
    assert_eq!(reply["createdAt"], "2026-01-02T03:04:05Z");

    let seen = provider.requests();
    assert_eq!(seen[0].path, "/v2/blockchain/token/create");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(seen[0].api_key.as_deref(), Some(TEST_API_KEY));
    let sent = &seen[0].body;
    assert_eq!(sent["decimals"], 18);
    assert_eq!(sent["total_supply"], "1000");
    assert_eq!(sent["symbol"], "TCN");
    assert_eq!(sent["network"], "testnet");
    assert_eq!(sent["issuer_password"], "issuer-secret");
}

#[tokio::test]
async fn token_create_rejects_bad_numbers() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let mut body = token_body();
    body["decimals"] = json!(19);
    let (status, _) = post(&relay, TOKEN_CREATE_PATH, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = token_body();
    body["totalSupply"] = json!(0);
    let (status, _) = post(&relay, TOKEN_CREATE_PATH, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = token_body();
    body.as_object_mut().unwrap().remove("issuerPassword");
    let (status, reply) = post(&relay, TOKEN_CREATE_PATH, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].as_str().unwrap().contains("issuerPassword"));

    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn token_failure_is_unavailable_even_with_fallback() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;

    let (status, reply) = post(&relay, TOKEN_CREATE_PATH, &token_body()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(reply.get("tokenId").is_none());

    provider.set_behavior(ProviderBehavior::NoTokenId);
    let (status, reply) = post(&relay, TOKEN_CREATE_PATH, &token_body()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(reply.get("tokenId").is_none());
}

#[tokio::test]
async fn credentials_stay_out_of_error_replies() {
    let provider = MockProvider::start(ProviderBehavior::Error).await;
    let relay = spawn_relay(relay_config(&provider)).await;

    let (_, reply) = post(&relay, TOKEN_CREATE_PATH, &token_body()).await;
    let text = reply.to_string();
    assert!(!text.contains("issuer-secret"));
    assert!(!text.contains("dist-secret"));
    assert!(!text.contains(TEST_API_KEY));
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_network_and_fallback() {
    let provider = MockProvider::start(ProviderBehavior::Ok).await;
    let relay = spawn_relay(relay_config(&provider).with_fallback(true)).await;

    let reply: Value = reqwest::get(format!("{relay}{HEALTH_PATH}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        reply,
        json!({ "status": "ok", "network": "testnet", "fallback": true })
    );
}
