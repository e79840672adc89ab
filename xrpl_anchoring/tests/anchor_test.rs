//! Anchoring against a mocked rippled JSON-RPC endpoint.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{matchers::method, Match, Mock, MockServer, Request, ResponseTemplate};
use xrpl_anchoring::{
    anchor::{AnchorRequest, Anchorer, EngineResultClass, LAST_LEDGER_OFFSET},
    client::XrplClient,
    digest::{default_credentials, invoice_id},
    error::AnchorError,
};

const ACCOUNT: &str = "raBiQyQUWvGiUEt8YW9ThW2WdnM8rajFL3";
const DESTINATION: &str = "rBjFFJkrfTvTwSzJGSTw45iGKjxxtoFXGc";
const ED25519_SEED: &str = "sEdTM1uX8pu2do5XvTnutH6HsouMaM2";
const TX_HASH: &str = "E08D6E9754025BA2534A78707605E0601F03ACE063687A0CA1BDDACFCD1698C7";

/// Matches a JSON-RPC call by its method name.
struct RpcMethod(&'static str);

impl Match for RpcMethod {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| body["method"] == self.0)
            .unwrap_or(false)
    }
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
}

async fn mount(server: &MockServer, rpc: &'static str, result: Value) {
    Mock::given(method("POST"))
        .and(RpcMethod(rpc))
        .respond_with(rpc_result(result))
        .mount(server)
        .await;
}

async fn mount_ledger_current(server: &MockServer, index: u32) {
    mount(
        server,
        "ledger_current",
        json!({ "ledger_current_index": index, "status": "success" }),
    )
    .await;
}

async fn mount_validated_ledger(server: &MockServer, index: u32) {
    mount(
        server,
        "ledger",
        json!({ "ledger_index": index, "validated": true, "status": "success" }),
    )
    .await;
}

fn anchorer(server: &MockServer) -> Anchorer {
    let client = XrplClient::new(&server.uri()).unwrap();
    Anchorer::new(client, ED25519_SEED, Duration::from_millis(10))
}

fn request(sequence: Option<u32>) -> AnchorRequest {
    AnchorRequest {
        account: ACCOUNT.to_owned(),
        destination: DESTINATION.to_owned(),
        amount_drops: 1_000_000,
        fee_drops: 12,
        sequence,
        invoice_id: invoice_id(&default_credentials()).unwrap(),
    }
}

async fn rpc_bodies(server: &MockServer, rpc: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter(|body| body["method"] == rpc)
        .collect()
}

#[tokio::test]
async fn prepare_autofills_sequence_and_last_ledger() {
    let server = MockServer::start().await;
    mount(
        &server,
        "account_info",
        json!({
            "account_data": { "Account": ACCOUNT, "Sequence": 38924475 },
            "status": "success",
        }),
    )
    .await;
    mount_ledger_current(&server, 100).await;

    let payment = anchorer(&server).prepare(&request(None)).await.unwrap();
    assert_eq!(payment.sequence, Some(38924475));
    assert_eq!(payment.last_ledger_sequence, Some(100 + LAST_LEDGER_OFFSET));
    assert_eq!(payment.amount, "1000000");
    assert_eq!(payment.fee, "12");
    assert_eq!(
        payment.invoice_id,
        "9AD72BBD1646CE41959025F8FF0AA476E0F3E673C47CD6F1858F41C4E94B3318"
    );
}

#[tokio::test]
async fn prepare_keeps_given_sequence() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;

    let payment = anchorer(&server).prepare(&request(Some(7))).await.unwrap();
    assert_eq!(payment.sequence, Some(7));
    assert!(rpc_bodies(&server, "account_info").await.is_empty());
}

#[tokio::test]
async fn anchor_waits_for_validation() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;
    mount_validated_ledger(&server, 99).await;
    mount(
        &server,
        "submit",
        json!({
            "engine_result": "tesSUCCESS",
            "engine_result_message": "The transaction was applied.",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;
    // unknown on the first lookup, validated on the next
    Mock::given(method("POST"))
        .and(RpcMethod("tx"))
        .respond_with(rpc_result(json!({
            "error": "txnNotFound",
            "error_message": "Transaction not found.",
            "status": "error",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "tx",
        json!({
            "hash": TX_HASH,
            "validated": true,
            "ledger_index": 101,
            "meta": { "TransactionResult": "tesSUCCESS" },
            "status": "success",
        }),
    )
    .await;

    let (submitted, validated) = anchorer(&server).anchor(&request(Some(7)), true).await.unwrap();
    assert_eq!(submitted.class, EngineResultClass::Success);
    assert_eq!(submitted.last_ledger_sequence, 120);
    let validated = validated.unwrap();
    assert_eq!(validated.hash, TX_HASH);
    assert_eq!(validated.ledger_index, Some(101));
    assert_eq!(rpc_bodies(&server, "tx").await.len(), 2);

    let submit = &rpc_bodies(&server, "submit").await[0]["params"][0];
    assert_eq!(submit["seed"], ED25519_SEED);
    assert_eq!(submit["key_type"], "ed25519");
    assert!(submit.get("secret").is_none());
    assert_eq!(submit["tx_json"]["TransactionType"], "Payment");
    assert_eq!(submit["tx_json"]["Sequence"], 7);
    assert_eq!(submit["tx_json"]["LastLedgerSequence"], 120);
}

#[tokio::test]
async fn anchor_without_wait_returns_after_submit() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;
    mount(
        &server,
        "submit",
        json!({
            "engine_result": "terQUEUED",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;

    let (submitted, validated) = anchorer(&server).anchor(&request(Some(7)), false).await.unwrap();
    assert_eq!(submitted.class, EngineResultClass::Retry);
    assert!(validated.is_none());
    assert!(rpc_bodies(&server, "tx").await.is_empty());
}

#[tokio::test]
async fn rejected_submission_is_an_error() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;
    mount(
        &server,
        "submit",
        json!({
            "engine_result": "tefPAST_SEQ",
            "engine_result_message": "This sequence number has already passed.",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;

    let result = anchorer(&server).anchor(&request(Some(7)), true).await;
    assert!(matches!(
        result,
        Err(AnchorError::Rejected { engine_result, .. }) if engine_result == "tefPAST_SEQ"
    ));
}

async fn mount_applied_submit(server: &MockServer) {
    mount(
        server,
        "submit",
        json!({
            "engine_result": "tesSUCCESS",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;
}

/// Prepared at ledger 100 (so LastLedgerSequence is 120), then the open ledger is 121.
async fn mount_open_ledger_past_last(server: &MockServer) {
    Mock::given(method("POST"))
        .and(RpcMethod("ledger_current"))
        .respond_with(rpc_result(json!({ "ledger_current_index": 100, "status": "success" })))
        .up_to_n_times(1)
        .mount(server)
        .await;
    mount_ledger_current(server, 121).await;
}

#[tokio::test]
async fn unvalidated_past_last_validated_ledger_expires() {
    let server = MockServer::start().await;
    mount_open_ledger_past_last(&server).await;
    mount_validated_ledger(&server, 121).await;
    mount_applied_submit(&server).await;
    mount(
        &server,
        "tx",
        json!({ "hash": TX_HASH, "validated": false, "status": "success" }),
    )
    .await;

    let result = anchorer(&server).anchor(&request(Some(7)), true).await;
    assert!(matches!(
        result,
        Err(AnchorError::Expired { last_ledger_sequence: 120, .. })
    ));
}

#[tokio::test]
async fn open_ledger_past_last_still_waits_for_validation() {
    let server = MockServer::start().await;
    mount_open_ledger_past_last(&server).await;
    // ledger 120 has closed but is not validated yet
    mount_validated_ledger(&server, 119).await;
    mount_applied_submit(&server).await;
    Mock::given(method("POST"))
        .and(RpcMethod("tx"))
        .respond_with(rpc_result(json!({
            "hash": TX_HASH,
            "validated": false,
            "ledger_index": 120,
            "status": "success",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "tx",
        json!({
            "hash": TX_HASH,
            "validated": true,
            "ledger_index": 120,
            "meta": { "TransactionResult": "tesSUCCESS" },
            "status": "success",
        }),
    )
    .await;

    let (submitted, validated) = anchorer(&server).anchor(&request(Some(7)), true).await.unwrap();
    assert_eq!(submitted.last_ledger_sequence, 120);
    assert_eq!(validated.unwrap().ledger_index, Some(120));
    assert_eq!(rpc_bodies(&server, "tx").await.len(), 2);
    assert_eq!(
        rpc_bodies(&server, "ledger").await[0]["params"][0]["ledger_index"],
        "validated"
    );
}

#[tokio::test]
async fn claimed_fee_without_wait_is_surfaced() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;
    mount(
        &server,
        "submit",
        json!({
            "engine_result": "tecUNFUNDED_PAYMENT",
            "engine_result_message": "Insufficient XRP balance to send.",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;

    let (submitted, validated) = anchorer(&server).anchor(&request(Some(7)), false).await.unwrap();
    assert_eq!(submitted.class, EngineResultClass::ClaimedFee);
    assert_eq!(submitted.engine_result, "tecUNFUNDED_PAYMENT");
    assert!(validated.is_none());
}

#[tokio::test]
async fn validated_failure_is_reported() {
    let server = MockServer::start().await;
    mount_ledger_current(&server, 100).await;
    mount(
        &server,
        "submit",
        json!({
            "engine_result": "tecUNFUNDED_PAYMENT",
            "tx_json": { "hash": TX_HASH },
            "status": "success",
        }),
    )
    .await;
    mount(
        &server,
        "tx",
        json!({
            "hash": TX_HASH,
            "validated": true,
            "meta": { "TransactionResult": "tecUNFUNDED_PAYMENT" },
            "status": "success",
        }),
    )
    .await;

    let result = anchorer(&server).anchor(&request(Some(7)), true).await;
    assert!(matches!(
        result,
        Err(AnchorError::Failed { result, .. }) if result == "tecUNFUNDED_PAYMENT"
    ));
}

#[tokio::test]
async fn rpc_errors_carry_the_server_code() {
    let server = MockServer::start().await;
    mount(
        &server,
        "account_info",
        json!({
            "error": "actNotFound",
            "error_message": "Account not found.",
            "status": "error",
        }),
    )
    .await;

    let client = XrplClient::new(&server.uri()).unwrap();
    let result = client.account_info(ACCOUNT).await;
    assert!(matches!(
        result,
        Err(AnchorError::Rpc { error, .. }) if error == "actNotFound"
    ));
}

#[test]
fn invalid_endpoint_is_rejected() {
    assert!(matches!(
        XrplClient::new("not a url"),
        Err(AnchorError::InvalidEndpoint(_))
    ));
}
