//! Session state: the active account and everything derived from it.
//!
//! One [`Session`] exists per [`crate::wallet::Wallet`]. It is shared with the event
//! bridge and the transfer orchestrator through a [`SessionHandle`]. Every mutation
//! happens under a single lock acquisition, so observers never see a half-applied
//! transition (for example a cleared account that still shows the old balance).

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::types::{Account, Amount, Transaction};

/// Session contents. Cloned out of the handle as a read-only snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    active_account: Option<Account>,
    native_balance: Option<Amount>,
    token_balance: Option<Amount>,
    /// Most recent first
    history: Vec<Transaction>,
    pending_transfer: bool,
    /// Bumped on every account change; refresh results carry the value they started under
    generation: u64,
}

/// Results of one refresh pass. `None` parts were not fetched (or failed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshUpdate {
    pub native_balance: Option<Amount>,
    pub token_balance: Option<Amount>,
    pub history: Option<Vec<Transaction>>,
}

impl Session {
    pub fn active_account(&self) -> Option<&Account> {
        self.active_account.as_ref()
    }

    pub fn native_balance(&self) -> Option<&Amount> {
        self.native_balance.as_ref()
    }

    pub fn token_balance(&self) -> Option<&Amount> {
        self.token_balance.as_ref()
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn is_transfer_pending(&self) -> bool {
        self.pending_transfer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.active_account.is_some()
    }

    /// Switch the active account. Returns the generation the new account lives under.
    ///
    /// Re-selecting the current account keeps its cached data and generation.
    /// Any other change (including to `None`) drops all derived fields.
    pub fn set_active_account(&mut self, account: Option<Account>) -> u64 {
        if self.active_account == account {
            return self.generation;
        }
        self.active_account = account;
        self.native_balance = None;
        self.token_balance = None;
        self.history.clear();
        self.generation += 1;
        self.generation
    }

    /// Ignored while no account is active.
    pub fn update_balances(&mut self, native: Option<Amount>, token: Option<Amount>) -> bool {
        if self.active_account.is_none() {
            return false;
        }
        self.native_balance = native;
        self.token_balance = token;
        true
    }

    /// Replaces the list wholesale. Ignored while no account is active.
    pub fn update_history(&mut self, history: Vec<Transaction>) -> bool {
        if self.active_account.is_none() {
            return false;
        }
        self.history = history;
        true
    }

    /// Apply a refresh that started under `generation`. Stale results are dropped.
    pub fn apply_refresh(&mut self, generation: u64, update: RefreshUpdate) -> bool {
        if generation != self.generation || self.active_account.is_none() {
            return false;
        }
        if let Some(native) = update.native_balance {
            self.native_balance = Some(native);
        }
        if let Some(token) = update.token_balance {
            self.token_balance = Some(token);
        }
        if let Some(history) = update.history {
            self.history = history;
        }
        true
    }

    pub fn begin_transfer(&mut self) -> Result<()> {
        if self.pending_transfer {
            return Err(WalletError::AlreadyPending);
        }
        self.pending_transfer = true;
        Ok(())
    }

    pub fn end_transfer(&mut self) {
        self.pending_transfer = false;
    }
}

/// Shared, lockable reference to the one session of a wallet instance.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // Every mutation is a single pass, so a poisoned value is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn active_account(&self) -> Option<Account> {
        self.lock().active_account.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_transfer_pending(&self) -> bool {
        self.lock().pending_transfer
    }

    pub fn set_active_account(&self, account: Option<Account>) -> u64 {
        let generation = self.lock().set_active_account(account.clone());
        debug!(?account, generation, "active account set");
        generation
    }

    pub fn update_balances(&self, native: Option<Amount>, token: Option<Amount>) -> bool {
        self.lock().update_balances(native, token)
    }

    pub fn update_history(&self, history: Vec<Transaction>) -> bool {
        self.lock().update_history(history)
    }

    pub fn apply_refresh(&self, generation: u64, update: RefreshUpdate) -> bool {
        self.lock().apply_refresh(generation, update)
    }

    /// Mark a transfer as in flight. The flag clears when the returned guard drops.
    pub fn begin_transfer(&self) -> Result<PendingTransfer> {
        self.lock().begin_transfer()?;
        Ok(PendingTransfer {
            session: self.clone(),
            released: false,
        })
    }

    // Only reachable through `PendingTransfer`
    fn end_transfer(&self) {
        self.lock().end_transfer();
    }
}

/// Holds the pending-transfer flag. Released exactly once, on `finish` or drop.
#[derive(Debug)]
pub struct PendingTransfer {
    session: SessionHandle,
    released: bool,
}

impl PendingTransfer {
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.session.end_transfer();
        }
    }
}

impl Drop for PendingTransfer {
    fn drop(&mut self) {
        self.release();
    }
}
