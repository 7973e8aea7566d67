//! Drives the JSON-RPC gateway and explorer client against an in-process mock node.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use xwallet::config::WalletConfig;
use xwallet::gateway::{JsonRpcGateway, ProviderGateway};
use xwallet::{Wallet, WalletError};

const ACCOUNT_A: &str = "0x1111111111111111111111111111111111111111";
const ACCOUNT_B: &str = "0x2222222222222222222222222222222222222222";
const RECIPIENT: &str = "0x3333333333333333333333333333333333333333";
const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

#[derive(Default)]
struct MockNode {
    accounts: Mutex<Vec<String>>,
    balance: Mutex<String>,
    /// Receipt polls answered with `null` before the receipt shows up
    pending_polls: AtomicUsize,
    receipt_polls: AtomicUsize,
    reject_sends: AtomicBool,
    sent: Mutex<Vec<Value>>,
    history: Mutex<Option<Vec<Value>>>,
    explorer_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl MockNode {
    fn new(accounts: &[&str]) -> Arc<Self> {
        let node = Self::default();
        *node.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
        // 2 ETH
        *node.balance.lock().unwrap() = "0x1bc16d674ec80000".to_string();
        Arc::new(node)
    }

    fn set_accounts(&self, accounts: &[&str]) {
        *self.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
    }
}

fn mined_receipt(hash: &str, block: &str) -> Value {
    json!({
        "type": "0x2",
        "status": "0x1",
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": block,
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": ACCOUNT_A,
        "to": RECIPIENT,
        "contractAddress": null,
    })
}

async fn rpc(State(node): State<Arc<MockNode>>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default();
    let reply: Result<Value, (i64, &str)> = match method {
        "eth_requestAccounts" => Err((-32601, "the method eth_requestAccounts does not exist")),
        "eth_accounts" => Ok(json!(*node.accounts.lock().unwrap())),
        "eth_getBalance" => Ok(json!(*node.balance.lock().unwrap())),
        // 5 tokens at 6 decimals
        "eth_call" => Ok(json!(
            "0x00000000000000000000000000000000000000000000000000000000004c4b40"
        )),
        "eth_sendTransaction" => {
            if node.reject_sends.load(Ordering::SeqCst) {
                Err((4001, "User denied transaction signature"))
            } else {
                node.sent.lock().unwrap().push(req["params"][0].clone());
                // 0.5 ETH left
                *node.balance.lock().unwrap() = "0x6f05b59d3b20000".to_string();
                Ok(json!(TX_HASH))
            }
        }
        "eth_getTransactionReceipt" => {
            let poll = node.receipt_polls.fetch_add(1, Ordering::SeqCst);
            if poll < node.pending_polls.load(Ordering::SeqCst) {
                Ok(Value::Null)
            } else {
                Ok(mined_receipt(TX_HASH, "0x112a880"))
            }
        }
        _ => Err((-32601, "method not found")),
    };

    Json(match reply {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    })
}

async fn explorer(State(node): State<Arc<MockNode>>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    node.explorer_queries.lock().unwrap().push(params);
    match node.history.lock().unwrap().clone() {
        Some(txs) => Json(json!({ "status": "1", "message": "OK", "result": txs })),
        None => Json(json!({ "status": "0", "message": "No transactions found", "result": [] })),
    }
}

async fn spawn_node(node: Arc<MockNode>) -> String {
    let app = Router::new()
        .route("/", post(rpc))
        .route("/api", get(explorer))
        .with_state(node);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base: &str) -> WalletConfig {
    let mut config = WalletConfig::default();
    config.provider.rpc_url = base.to_string();
    config.provider.history_url = format!("{}/api", base);
    config.provider.history_api_key = Some("test-key".to_string());
    config.provider.account_poll_interval_ms = 20;
    config.provider.receipt_poll_interval_ms = 10;
    config.token.contract = "0x4444444444444444444444444444444444444444".to_string();
    config.token.decimals = 6;
    config
}

fn wallet_for(base: &str) -> Wallet {
    let config = config_for(base);
    let gateway: Arc<dyn ProviderGateway> = Arc::new(JsonRpcGateway::from_config(&config).unwrap());
    Wallet::new(Some(gateway), config)
}

fn explorer_tx(hash: &str, from: &str, to: &str, block: u64) -> Value {
    json!({
        "hash": hash,
        "from": from,
        "to": to,
        "contractAddress": "",
        "value": "1000000000000000000",
        "blockNumber": block.to_string(),
        "timeStamp": "1700000000",
    })
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn connect_populates_session_from_node_and_explorer() {
    let node = MockNode::new(&[ACCOUNT_A]);
    *node.history.lock().unwrap() = Some(vec![
        explorer_tx("0x02", RECIPIENT, ACCOUNT_A, 20),
        explorer_tx("0x01", ACCOUNT_A, RECIPIENT, 10),
    ]);
    let base = spawn_node(node.clone()).await;
    let wallet = wallet_for(&base);

    assert_eq!(wallet.connect().await.unwrap(), ACCOUNT_A);

    let snapshot = wallet.snapshot();
    assert_eq!(snapshot.native_balance().unwrap().to_string(), "2");
    assert_eq!(snapshot.token_balance().unwrap().to_string(), "5");
    assert_eq!(snapshot.history().len(), 2);
    assert_eq!(snapshot.history()[0].hash, "0x02");
    assert_eq!(snapshot.history()[0].counterpart, RECIPIENT);
    assert_eq!(snapshot.history()[1].counterpart, RECIPIENT);

    let queries = node.explorer_queries.lock().unwrap().clone();
    assert_eq!(queries[0]["action"], "txlist");
    assert_eq!(queries[0]["address"], ACCOUNT_A);
    assert_eq!(queries[0]["apikey"], "test-key");
}

#[tokio::test]
async fn send_waits_for_receipt_and_refreshes() {
    let node = MockNode::new(&[ACCOUNT_A]);
    node.pending_polls.store(2, Ordering::SeqCst);
    let base = spawn_node(node.clone()).await;
    let wallet = wallet_for(&base);
    wallet.connect().await.unwrap();
    assert!(wallet.snapshot().history().is_empty());

    let receipt = wallet.send(RECIPIENT, "1.5").await.unwrap();
    assert_eq!(receipt.hash, TX_HASH);
    assert_eq!(receipt.block_number, 18_000_000);
    assert_eq!(receipt.gas_used.to::<u64>(), 21_000);
    assert_eq!(node.receipt_polls.load(Ordering::SeqCst), 3);

    let sent = node.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["from"], ACCOUNT_A);
    assert_eq!(sent[0]["to"], RECIPIENT);
    assert_eq!(sent[0]["value"], "0x14d1120d7b160000");

    let snapshot = wallet.snapshot();
    assert_eq!(snapshot.native_balance().unwrap().to_string(), "0.5");
    assert!(!snapshot.is_transfer_pending());
}

#[tokio::test]
async fn rejected_signature_is_transfer_failure() {
    let node = MockNode::new(&[ACCOUNT_A]);
    node.reject_sends.store(true, Ordering::SeqCst);
    let base = spawn_node(node.clone()).await;
    let wallet = wallet_for(&base);
    wallet.connect().await.unwrap();

    let err = wallet.send(RECIPIENT, "0.1").await.unwrap_err();
    assert!(matches!(err, WalletError::TransferFailed(ref msg) if msg.contains("rejected")));
    assert_eq!(node.receipt_polls.load(Ordering::SeqCst), 0);
    assert!(!wallet.snapshot().is_transfer_pending());
}

#[tokio::test]
async fn unreachable_node_is_no_provider() {
    // Nothing listens on port 9 locally
    let wallet = wallet_for("http://127.0.0.1:9");
    let err = wallet.connect().await.unwrap_err();
    assert!(matches!(err, WalletError::NoProvider(_)));
    assert_eq!(wallet.snapshot().active_account(), None);
}

#[tokio::test]
async fn polled_account_changes_drive_the_session() {
    let node = MockNode::new(&[ACCOUNT_A]);
    let base = spawn_node(node.clone()).await;
    let wallet = wallet_for(&base);
    wallet.connect().await.unwrap();
    let bridge = wallet.mount().unwrap();

    // Let the watcher record its baseline first
    tokio::time::sleep(Duration::from_millis(60)).await;
    node.set_accounts(&[ACCOUNT_B]);
    assert!(wait_until(|| wallet.snapshot().active_account().map(String::as_str) == Some(ACCOUNT_B)).await);
    assert!(wait_until(|| wallet.snapshot().native_balance().is_some()).await);

    node.set_accounts(&[]);
    assert!(wait_until(|| wallet.snapshot().active_account().is_none()).await);
    assert_eq!(wallet.snapshot().native_balance(), None);

    drop(bridge);
    node.set_accounts(&[ACCOUNT_A]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(wallet.snapshot().active_account(), None);
}
