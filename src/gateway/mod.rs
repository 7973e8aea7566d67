//! Provider gateway: the external wallet/RPC capability the session delegates to.
//!
//! Everything chain-facing goes through [`ProviderGateway`]. The session never signs,
//! never builds raw transactions and never talks to a node directly.

pub mod history;
pub mod json_rpc;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use alloy::primitives::U256;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::types::{Account, Amount, Transaction, TransferRequest, TxHash, TxReceipt};

pub use history::HistoryClient;
pub use json_rpc::{JsonRpcGateway, RpcClient};

/// Callback invoked with the wallet's new account list (possibly empty).
pub type AccountsChangedHandler = Arc<dyn Fn(Vec<Account>) + Send + Sync>;

/// Handle returned by a subscription, needed to release it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Ask the wallet to expose its accounts (may prompt the user).
    async fn request_accounts(&self) -> Result<Vec<Account>, GatewayError>;

    /// Native balance of `account`.
    async fn get_balance(&self, account: &Account) -> Result<Amount, GatewayError>;

    /// Raw ERC-20 `balanceOf(account)` on `token_contract`, in the token's smallest unit.
    async fn token_balance_of(&self, token_contract: &str, account: &Account) -> Result<U256, GatewayError>;

    /// Transactions touching `account`, most recent first.
    async fn get_history(&self, account: &Account) -> Result<Vec<Transaction>, GatewayError>;

    /// Hand the transfer to the wallet for signing and broadcast.
    async fn send_transaction(&self, request: TransferRequest) -> Result<TxHash, GatewayError>;

    /// Block until `hash` is mined. No timeout of its own.
    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TxReceipt, GatewayError>;

    fn subscribe_accounts_changed(&self, handler: AccountsChangedHandler) -> Result<SubscriptionId, GatewayError>;

    /// Returns false if `id` was not (or no longer) registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
