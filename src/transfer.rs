//! Transfer orchestrator: validate, submit, confirm and refresh one native transfer.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::WalletConfig;
use crate::error::{GatewayError, Result, WalletError};
use crate::gateway::ProviderGateway;
use crate::notify::{Notice, Notifier};
use crate::refresh::{refresh_account, RefreshScope};
use crate::session::SessionHandle;
use crate::types::{Amount, TransferRequest, TxReceipt};

pub struct TransferOrchestrator {
    session: SessionHandle,
    gateway: Arc<dyn ProviderGateway>,
    config: Arc<WalletConfig>,
    notifier: Notifier,
}

impl TransferOrchestrator {
    pub fn new(
        session: SessionHandle,
        gateway: Arc<dyn ProviderGateway>,
        config: Arc<WalletConfig>,
        notifier: Notifier,
    ) -> Self {
        Self {
            session,
            gateway,
            config,
            notifier,
        }
    }

    /// Send `amount` (decimal, native units) from the active account to `recipient`.
    ///
    /// Input problems are reported before anything reaches the gateway. Once submitted,
    /// the pending flag stays set until confirmation (or failure) and the post-transfer
    /// refresh have completed.
    pub async fn send(&self, recipient: &str, amount: &str) -> Result<TxReceipt> {
        if self.session.is_transfer_pending() {
            return Err(WalletError::AlreadyPending);
        }
        let (request, generation) = match self.validate(recipient, amount) {
            Ok(v) => v,
            Err(e) => {
                self.notifier.error(e.clone());
                return Err(e);
            }
        };

        let pending = self.session.begin_transfer()?;
        info!(from = %request.from, to = %request.to, value = %request.value, "submitting transfer");

        let receipt = match self.submit(request.clone()).await {
            Ok(receipt) => receipt,
            Err(cause) => {
                error!("Transfer failed: {}", cause);
                pending.finish();
                let err = WalletError::TransferFailed(cause.to_string());
                self.notifier.error(err.clone());
                return Err(err);
            }
        };

        info!(hash = %receipt.hash, block = receipt.block_number, "transfer confirmed");
        if let Err(e) = refresh_account(
            &self.session,
            self.gateway.as_ref(),
            &self.config.token,
            &request.from,
            generation,
            RefreshScope::AfterTransfer,
        )
        .await
        {
            warn!("post-transfer refresh failed: {}", e);
            self.notifier.error(e);
        }
        pending.finish();

        self.notifier.info(Notice::TransferConfirmed(receipt.clone()));
        Ok(receipt)
    }

    fn validate(&self, recipient: &str, amount: &str) -> Result<(TransferRequest, u64)> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(WalletError::InvalidInput("recipient address is required".to_string()));
        }
        if recipient.chars().any(char::is_whitespace) {
            return Err(WalletError::InvalidInput(format!("malformed recipient address: {:?}", recipient)));
        }

        let value = Amount::parse_native(amount).map_err(|e| WalletError::InvalidInput(e.to_string()))?;
        if value.is_zero() {
            return Err(WalletError::InvalidInput("amount must be greater than zero".to_string()));
        }

        let snapshot = self.session.snapshot();
        let from = snapshot
            .active_account()
            .cloned()
            .ok_or_else(|| WalletError::InvalidInput("no active account, connect a wallet first".to_string()))?;

        Ok((
            TransferRequest {
                from,
                to: recipient.to_string(),
                value,
            },
            snapshot.generation(),
        ))
    }

    async fn submit(&self, request: TransferRequest) -> std::result::Result<TxReceipt, GatewayError> {
        let hash = self.gateway.send_transaction(request).await?;
        info!(%hash, "transfer broadcast, awaiting confirmation");
        self.notifier.publish(Notice::TransferSubmitted(hash.clone()));

        let wait = self.gateway.wait_for_receipt(&hash);
        let receipt = match self.config.confirmation_timeout() {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(receipt) => receipt?,
                Err(_) => return Err(GatewayError::Timeout(timeout_message(&hash, limit))),
            },
            None => wait.await?,
        };

        if !receipt.succeeded() {
            return Err(GatewayError::Reverted(receipt.hash));
        }
        Ok(receipt)
    }
}

fn timeout_message(hash: &str, limit: Duration) -> String {
    format!("no confirmation for {} within {}s", hash, limit.as_secs())
}
