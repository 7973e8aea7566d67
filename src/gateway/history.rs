// Transaction history from an Etherscan-compatible explorer API
use alloy::primitives::U256;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::GatewayError;
use crate::types::{Account, Amount, Transaction};

/// Explorer reply when the address simply has no transactions yet
const NO_TRANSACTIONS: &str = "No transactions found";

pub struct HistoryClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerTx {
    hash: String,
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    contract_address: String,
    value: String,
    block_number: String,
    time_stamp: String,
}

impl ExplorerTx {
    fn into_transaction(self, account: &str) -> Result<Transaction, GatewayError> {
        let value = U256::from_str_radix(&self.value, 10)
            .map_err(|e| GatewayError::Parse(format!("tx {} value {:?}: {}", self.hash, self.value, e)))?;
        let to = if self.to.is_empty() { None } else { Some(self.to) };
        let counterpart = if self.from.eq_ignore_ascii_case(account) {
            // Contract creations have no `to`
            to.clone().unwrap_or(self.contract_address)
        } else {
            self.from.clone()
        };
        let timestamp = self
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(Transaction {
            hash: self.hash,
            value: Amount::native(value),
            from: self.from,
            to,
            counterpart,
            block_number: self.block_number.parse().ok(),
            timestamp,
        })
    }
}

impl HistoryClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            base_url,
            api_key,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Normal (external) transactions of `account`, newest first.
    pub async fn fetch(&self, account: &Account) -> Result<Vec<Transaction>, GatewayError> {
        let mut query = vec![
            ("module", "account"),
            ("action", "txlist"),
            ("address", account.as_str()),
            ("sort", "desc"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let response: ExplorerResponse = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?
            .json()
            .await?;

        if response.status != "1" {
            if response.message.starts_with(NO_TRANSACTIONS) {
                return Ok(Vec::new());
            }
            let detail = response.result.as_str().unwrap_or_default();
            return Err(GatewayError::Rpc {
                code: 0,
                message: format!("{} {}", response.message, detail).trim().to_string(),
            });
        }

        let raw: Vec<ExplorerTx> = serde_json::from_value(response.result)?;
        debug!(%account, count = raw.len(), "history fetched");
        raw.into_iter().map(|tx| tx.into_transaction(account)).collect()
    }
}
