// JSON-RPC binding of the provider gateway for an EVM node or wallet that owns the keys
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AccountsChangedHandler, HistoryClient, ProviderGateway, SubscriptionId};
use crate::config::WalletConfig;
use crate::error::GatewayError;
use crate::types::{Account, Amount, Transaction, TransferRequest, TxHash, TxReceipt, TxStatus};

sol!(
    function balanceOf(address owner) public view returns (uint256 balance);
);

/// EIP-1193 "user rejected request"
const USER_REJECTED: i64 = 4001;
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Clone)]
pub struct RpcClient {
    url: String,
    client: Client,
    request_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            client,
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub async fn send_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "rpc request");

        let response = self.client.post(&self.url).json(&request).send().await?;
        let json: serde_json::Value = response.json().await?;

        if let Some(error) = json.get("error") {
            return Err(GatewayError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("Unknown error").to_string(),
            });
        }

        let result = json.get("result").cloned().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(result)?)
    }
}

/// `None` while the node reports the transaction as not yet in a block.
fn into_receipt(receipt: TransactionReceipt) -> Option<TxReceipt> {
    let block_number = receipt.block_number?;
    // Pre-Byzantium receipts carry a state root instead of a status and count as success
    let status = if receipt.status() {
        TxStatus::Success
    } else {
        TxStatus::Reverted
    };
    Some(TxReceipt {
        hash: receipt.transaction_hash.to_string(),
        block_number,
        status,
        gas_used: U256::from(receipt.gas_used),
    })
}

/// `eth_call` payload for `balanceOf(owner)`.
pub fn encode_balance_of(owner: &str) -> Result<String, GatewayError> {
    let owner: Address = owner
        .parse()
        .map_err(|e| GatewayError::Parse(format!("address {}: {}", owner, e)))?;
    let call = balanceOfCall { owner };
    Ok(format!("0x{}", hex::encode(call.abi_encode())))
}

pub struct JsonRpcGateway {
    client: RpcClient,
    history: HistoryClient,
    account_poll_interval: Duration,
    receipt_poll_interval: Duration,
    watchers: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl JsonRpcGateway {
    pub fn new(client: RpcClient, history: HistoryClient) -> Self {
        Self {
            client,
            history,
            account_poll_interval: Duration::from_secs(1),
            receipt_poll_interval: Duration::from_secs(2),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, GatewayError> {
        let client = RpcClient::new(config.provider.rpc_url.clone(), config.request_timeout())?;
        let history = HistoryClient::new(
            config.provider.history_url.clone(),
            config.provider.history_api_key.clone(),
            config.request_timeout(),
        )?;
        Ok(Self::new(client, history).with_poll_intervals(config.account_poll_interval(), config.receipt_poll_interval()))
    }

    pub fn with_poll_intervals(mut self, accounts: Duration, receipts: Duration) -> Self {
        self.account_poll_interval = accounts;
        self.receipt_poll_interval = receipts;
        self
    }

    fn watchers(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.watchers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProviderGateway for JsonRpcGateway {
    async fn request_accounts(&self) -> Result<Vec<Account>, GatewayError> {
        match self.client.send_request::<Vec<Account>>("eth_requestAccounts", json!([])).await {
            Ok(accounts) => Ok(accounts),
            Err(GatewayError::Rpc { code: USER_REJECTED, .. }) => Err(GatewayError::Rejected),
            // Plain nodes only know eth_accounts
            Err(GatewayError::Rpc { code: METHOD_NOT_FOUND, .. }) => {
                self.client.send_request("eth_accounts", json!([])).await
            }
            Err(e) => Err(e),
        }
    }

    async fn get_balance(&self, account: &Account) -> Result<Amount, GatewayError> {
        let raw: U256 = self.client.send_request("eth_getBalance", json!([account, "latest"])).await?;
        Ok(Amount::native(raw))
    }

    async fn token_balance_of(&self, token_contract: &str, account: &Account) -> Result<U256, GatewayError> {
        let call = json!({
            "to": token_contract,
            "data": encode_balance_of(account)?,
        });
        let output: Bytes = self.client.send_request("eth_call", json!([call, "latest"])).await?;
        let decoded = balanceOfCall::abi_decode_returns(&output, true)
            .map_err(|e| GatewayError::Parse(format!("balanceOf({}) on {}: {}", account, token_contract, e)))?;
        Ok(decoded.balance)
    }

    async fn get_history(&self, account: &Account) -> Result<Vec<Transaction>, GatewayError> {
        self.history.fetch(account).await
    }

    async fn send_transaction(&self, request: TransferRequest) -> Result<TxHash, GatewayError> {
        let tx = json!({
            "from": request.from,
            "to": request.to,
            "value": request.value.raw,
        });
        match self.client.send_request::<TxHash>("eth_sendTransaction", json!([tx])).await {
            Err(GatewayError::Rpc { code: USER_REJECTED, .. }) => Err(GatewayError::Rejected),
            other => other,
        }
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TxReceipt, GatewayError> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .client
                .send_request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if let Some(receipt) = receipt.and_then(into_receipt) {
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    fn subscribe_accounts_changed(&self, handler: AccountsChangedHandler) -> Result<SubscriptionId, GatewayError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GatewayError::Unavailable(format!("no async runtime for account polling: {}", e)))?;

        let id = SubscriptionId::new();
        let client = self.client.clone();
        let interval = self.account_poll_interval;
        let watcher = runtime.spawn(async move {
            let mut last: Option<Vec<Account>> = None;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match client.send_request::<Vec<Account>>("eth_accounts", json!([])).await {
                    Ok(accounts) => {
                        // The first poll only records the baseline
                        if last.as_ref().is_some_and(|prev| *prev != accounts) {
                            handler(accounts.clone());
                        }
                        last = Some(accounts);
                    }
                    Err(e) => warn!("eth_accounts poll failed: {}", e),
                }
            }
        });

        self.watchers().insert(id, watcher);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.watchers().remove(&id) {
            Some(watcher) => {
                watcher.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for JsonRpcGateway {
    fn drop(&mut self) {
        for (_, watcher) in self.watchers().drain() {
            watcher.abort();
        }
    }
}
