//! In-memory gateway used by the unit tests.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{AccountsChangedHandler, ProviderGateway, SubscriptionId};
use crate::error::GatewayError;
use crate::types::{Account, Amount, Transaction, TransferRequest, TxHash, TxReceipt, TxStatus};

#[derive(Default)]
pub struct CallCounts {
    pub request_accounts: AtomicUsize,
    pub get_balance: AtomicUsize,
    pub token_balance_of: AtomicUsize,
    pub get_history: AtomicUsize,
    pub send_transaction: AtomicUsize,
    pub wait_for_receipt: AtomicUsize,
    pub unsubscribe: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    balances: HashMap<Account, U256>,
    token_balances: HashMap<Account, U256>,
    histories: HashMap<Account, Vec<Transaction>>,
    handlers: HashMap<SubscriptionId, AccountsChangedHandler>,
    balance_gates: HashMap<Account, Arc<Notify>>,
    send_error: Option<GatewayError>,
    receipt_error: Option<GatewayError>,
    history_error: Option<GatewayError>,
    receipt_status: Option<TxStatus>,
    sent: Vec<TransferRequest>,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
    pub calls: CallCounts,
    /// When set, `wait_for_receipt` parks until `release_receipt` is called
    receipt_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: &str, balance_wei: u64) -> Self {
        let gateway = Self::new();
        gateway.set_accounts(vec![account.to_string()]);
        gateway.set_balance(account, balance_wei);
        gateway
    }

    pub fn set_accounts(&self, accounts: Vec<Account>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_balance(&self, account: &str, wei: u64) {
        self.state.lock().unwrap().balances.insert(account.to_string(), U256::from(wei));
    }

    pub fn set_token_balance(&self, account: &str, raw: u64) {
        self.state.lock().unwrap().token_balances.insert(account.to_string(), U256::from(raw));
    }

    pub fn set_history(&self, account: &str, history: Vec<Transaction>) {
        self.state.lock().unwrap().histories.insert(account.to_string(), history);
    }

    pub fn fail_send(&self, err: GatewayError) {
        self.state.lock().unwrap().send_error = Some(err);
    }

    pub fn fail_receipt(&self, err: GatewayError) {
        self.state.lock().unwrap().receipt_error = Some(err);
    }

    pub fn fail_history(&self, err: GatewayError) {
        self.state.lock().unwrap().history_error = Some(err);
    }

    pub fn revert_receipts(&self) {
        self.state.lock().unwrap().receipt_status = Some(TxStatus::Reverted);
    }

    /// Park `get_balance(account)` until the returned notify is triggered.
    pub fn gate_balance(&self, account: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .balance_gates
            .insert(account.to_string(), gate.clone());
        gate
    }

    /// Park every `wait_for_receipt` until `release_receipt`.
    pub fn hold_receipts(&self) {
        *self.receipt_gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_receipt(&self) {
        if let Some(gate) = self.receipt_gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    pub fn sent(&self) -> Vec<TransferRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().unwrap().handlers.len()
    }

    /// Deliver an account-change notification to every subscriber.
    pub fn emit_accounts(&self, accounts: Vec<&str>) {
        let accounts: Vec<Account> = accounts.into_iter().map(str::to_string).collect();
        let handlers: Vec<AccountsChangedHandler> = {
            let mut state = self.state.lock().unwrap();
            state.accounts = accounts.clone();
            state.handlers.values().cloned().collect()
        };
        for handler in handlers {
            handler(accounts.clone());
        }
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    async fn request_accounts(&self) -> Result<Vec<Account>, GatewayError> {
        self.calls.request_accounts.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn get_balance(&self, account: &Account) -> Result<Amount, GatewayError> {
        self.calls.get_balance.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().unwrap().balance_gates.remove(account);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let raw = self
            .state
            .lock()
            .unwrap()
            .balances
            .get(account)
            .cloned()
            .unwrap_or_default();
        Ok(Amount::native(raw))
    }

    async fn token_balance_of(&self, _token_contract: &str, account: &Account) -> Result<U256, GatewayError> {
        self.calls.token_balance_of.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .unwrap()
            .token_balances
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_history(&self, account: &Account) -> Result<Vec<Transaction>, GatewayError> {
        self.calls.get_history.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if let Some(err) = &state.history_error {
            return Err(err.clone());
        }
        Ok(state.histories.get(account).cloned().unwrap_or_default())
    }

    async fn send_transaction(&self, request: TransferRequest) -> Result<TxHash, GatewayError> {
        let n = self.calls.send_transaction.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.send_error {
            return Err(err.clone());
        }
        state.sent.push(request);
        Ok(format!("0x{:064x}", n + 1))
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TxReceipt, GatewayError> {
        self.calls.wait_for_receipt.fetch_add(1, Ordering::SeqCst);
        let gate = self.receipt_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state.lock().unwrap();
        if let Some(err) = &state.receipt_error {
            return Err(err.clone());
        }
        Ok(TxReceipt {
            hash: hash.clone(),
            block_number: 1,
            status: state.receipt_status.unwrap_or(TxStatus::Success),
            gas_used: U256::from(21_000u32),
        })
    }

    fn subscribe_accounts_changed(&self, handler: AccountsChangedHandler) -> Result<SubscriptionId, GatewayError> {
        let id = SubscriptionId::new();
        self.state.lock().unwrap().handlers.insert(id, handler);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.calls.unsubscribe.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().handlers.remove(&id).is_some()
    }
}
