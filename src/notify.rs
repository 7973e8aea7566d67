//! User-visible notices. Errors never abort the session; they end up here.

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::WalletError;
use crate::types::{Account, TxHash, TxReceipt};

const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connected(Account),
    Disconnected,
    /// Balances and history for the account were refreshed
    Refreshed(Account),
    TransferSubmitted(TxHash),
    TransferConfirmed(TxReceipt),
    Error(WalletError),
}

/// Fan-out of notices to whatever front end is listening (possibly none).
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notice: Notice) {
        // No listeners is fine
        let _ = self.tx.send(notice);
    }

    pub fn info(&self, notice: Notice) {
        info!(?notice, "notice");
        self.publish(notice);
    }

    pub fn error(&self, err: WalletError) {
        warn!("{}", err);
        self.publish(Notice::Error(err));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
