//! Both transports, fed the same archive data, must produce identical
//! normalized results.
//!
//! The REST adapter talks to a wiremock server serving the JSON fixtures;
//! the RPC adapter talks to a TCP fixture server serving the same data as
//! bincode frames.

mod common;

use std::time::Duration;

use tickcast_client::archive::TickTransactionSet;
use tickcast_client::config::{RestConfig, RpcConfig};
use tickcast_client::transaction::{Transaction, TransactionBuilder};
use tickcast_client::transport::rpc::wire::{Reply, Request, WireBroadcast, WireError};
use tickcast_client::transport::{RestTransport, RpcTransport, Transport, TransportError};
use tickcast_client::{SourceAccount, TxId};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    serve_rpc, status_json, tick_transactions_json, wire_status, wire_tick_transactions,
    OTHER_SEED, SEED,
};

const TICK: u32 = 16_001_010;

async fn rest_archive() -> (MockServer, RestTransport) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/ticks/{TICK}/transactions")))
        .and(query_param("transfers", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tick_transactions_json()))
        .mount(&server)
        .await;

    let transport = rest_transport(&server);
    (server, transport)
}

fn rest_transport(server: &MockServer) -> RestTransport {
    RestTransport::new(RestConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

fn signed_transfer(amount: i64) -> Transaction {
    let account = SourceAccount::from_seed(SEED).unwrap();
    let dest = SourceAccount::from_seed(OTHER_SEED).unwrap();
    let unsigned = TransactionBuilder::new(account.identity().as_str(), dest.identity().as_str())
        .amount(amount)
        .tick(TICK)
        .build()
        .unwrap();
    account.sign(unsigned).unwrap()
}

fn rpc_transport(address: String) -> RpcTransport {
    RpcTransport::new(RpcConfig {
        address,
        timeout: Duration::from_secs(2),
    })
}

#[tokio::test]
async fn status_is_identical_across_transports() {
    let (_server, rest) = rest_archive().await;
    let (address, fixture) = serve_rpc(vec![Reply::Status(wire_status(&status_json()))]).await;
    let rpc = rpc_transport(address);

    let from_rest = rest.fetch_status().await.unwrap();
    let from_rpc = rpc.fetch_status().await.unwrap();
    assert_eq!(from_rest, from_rpc);

    assert_eq!(from_rest.last_processed(), 16_001_012);
    assert_eq!(from_rest.current_epoch(), 118);
    assert_eq!(from_rest.last_processed_ticks_per_epoch.get(&117), Some(&15_999_999));
    assert_eq!(from_rest.empty_ticks_per_epoch.get(&118), Some(&42));
    assert!(from_rest.is_skipped(16_000_505));
    assert!(from_rest.is_processed(16_000_600));
    assert!(!from_rest.is_processed(16_000_505));

    assert_eq!(fixture.await.unwrap(), vec![Request::GetStatus]);
}

#[tokio::test]
async fn tick_transactions_are_identical_across_transports() {
    let (_server, rest) = rest_archive().await;
    let (address, fixture) = serve_rpc(vec![Reply::TickTransactions(wire_tick_transactions(
        &tick_transactions_json(),
    ))])
    .await;
    let rpc = rpc_transport(address);

    let from_rest: TickTransactionSet = rest.fetch_tick_transactions(TICK, true).await.unwrap();
    let from_rpc = rpc.fetch_tick_transactions(TICK, true).await.unwrap();

    assert_eq!(from_rest, from_rpc);
    assert_eq!(from_rest.tx_ids(), from_rpc.tx_ids());
    assert_eq!(from_rest.len(), 3);

    let large = &from_rest.transactions[1];
    assert_eq!(large.transaction.amount, 9_223_372_036_854_775_000);
    assert_eq!(large.transaction.input, vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(large.transaction.input_size, 4);
    assert!(!large.money_flew);
    assert_eq!(large.timestamp.timestamp_millis(), 1_718_461_234_000);

    assert!(from_rest.tx_ids().contains("igjqhyskirnebxlovsqnqereqqaoyftayzefeptxdrbkvqqrpzydrbhgibyd"));
    assert!(!from_rpc.contains(&TxId::from_hash([0; 32])));

    assert_eq!(
        fixture.await.unwrap(),
        vec![Request::GetTickTransactionsV2 {
            tick_number: TICK,
            approved_only: false,
            transfers_only: true,
        }]
    );
}

#[tokio::test]
async fn empty_tick_is_identical_across_transports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/ticks/77/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "transactions": []
        })))
        .mount(&server)
        .await;
    let rest = rest_transport(&server);
    let (address, _fixture) = serve_rpc(vec![Reply::TickTransactions(
        wire_tick_transactions(&serde_json::json!({ "transactions": [] })),
    )])
    .await;
    let rpc = rpc_transport(address);

    let from_rest = rest.fetch_tick_transactions(77, false).await.unwrap();
    let from_rpc = rpc.fetch_tick_transactions(77, false).await.unwrap();
    assert_eq!(from_rest, TickTransactionSet::empty(77));
    assert_eq!(from_rest, from_rpc);
}

#[tokio::test]
async fn remote_errors_carry_the_same_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/latestTick"))
        .respond_with(ResponseTemplate::new(503).set_body_string("archiver catching up"))
        .mount(&server)
        .await;
    let rest = rest_transport(&server);
    let (address, _fixture) = serve_rpc(vec![Reply::Error(WireError {
        code: 503,
        message: "archiver catching up".into(),
    })])
    .await;
    let rpc = rpc_transport(address);

    for error in [
        rest.fetch_latest_tick().await.unwrap_err(),
        rpc.fetch_latest_tick().await.unwrap_err(),
    ] {
        assert!(matches!(error, TransportError::Remote { code: 503, .. }));
        assert_eq!(error.operation(), "fetch_latest_tick");
        assert!(!error.is_retryable());
    }
}

#[tokio::test]
async fn latest_tick_is_identical_across_transports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/latestTick"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latestTick": 16_001_020
        })))
        .mount(&server)
        .await;
    let rest = rest_transport(&server);
    let (address, fixture) = serve_rpc(vec![Reply::LatestTick {
        latest_tick: 16_001_020,
    }])
    .await;
    let rpc = rpc_transport(address);

    let from_rest = rest.fetch_latest_tick().await.unwrap();
    let from_rpc = rpc.fetch_latest_tick().await.unwrap();
    assert_eq!(from_rest, 16_001_020);
    assert_eq!(from_rest, from_rpc);
    assert_eq!(fixture.await.unwrap(), vec![Request::GetLatestTick]);
}

#[tokio::test]
async fn broadcast_receipts_are_identical_across_transports() {
    let tx = signed_transfer(5);
    let encoded = tx.to_base64();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/broadcast-transaction"))
        .and(body_json(serde_json::json!({ "encodedTransaction": encoded })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "peersBroadcasted": 12,
            "encodedTransaction": encoded
        })))
        .expect(1)
        .mount(&server)
        .await;
    let rest = rest_transport(&server);
    let (address, fixture) = serve_rpc(vec![Reply::Broadcast(WireBroadcast {
        peers_broadcasted: 12,
        encoded_transaction: encoded.clone(),
    })])
    .await;
    let rpc = rpc_transport(address);

    let from_rest = rest.broadcast(&tx).await.unwrap();
    let from_rpc = rpc.broadcast(&tx).await.unwrap();
    assert_eq!(from_rest.peers_broadcasted, 12);
    assert_eq!(from_rest, from_rpc);
    assert_eq!(
        fixture.await.unwrap(),
        vec![Request::BroadcastTransaction { encoded }]
    );
}

#[tokio::test]
async fn foreign_broadcast_echo_is_rejected_by_both_transports() {
    let tx = signed_transfer(5);
    let foreign = signed_transfer(6).to_base64();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/broadcast-transaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "peersBroadcasted": 12,
            "encodedTransaction": foreign
        })))
        .mount(&server)
        .await;
    let rest = rest_transport(&server);
    let (address, _fixture) = serve_rpc(vec![Reply::Broadcast(WireBroadcast {
        peers_broadcasted: 12,
        encoded_transaction: foreign.clone(),
    })])
    .await;
    let rpc = rpc_transport(address);

    for error in [
        rest.broadcast(&tx).await.unwrap_err(),
        rpc.broadcast(&tx).await.unwrap_err(),
    ] {
        assert!(matches!(error, TransportError::Protocol { .. }));
        assert_eq!(error.operation(), "broadcast");
        assert!(!error.is_retryable());
    }
}
