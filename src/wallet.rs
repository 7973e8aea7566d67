//! Wallet component root: owns the session for its whole lifetime and wires the
//! provider, the event bridge and the transfer orchestrator to it.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::bridge::EventBridge;
use crate::config::WalletConfig;
use crate::error::{GatewayError, Result, WalletError};
use crate::gateway::ProviderGateway;
use crate::notify::{Notice, Notifier};
use crate::refresh::{refresh_account, RefreshScope};
use crate::session::{Session, SessionHandle};
use crate::transfer::TransferOrchestrator;
use crate::types::{Account, TxReceipt};

pub struct Wallet {
    session: SessionHandle,
    provider: Option<Arc<dyn ProviderGateway>>,
    config: Arc<WalletConfig>,
    notifier: Notifier,
}

impl Wallet {
    /// `provider` is `None` when no wallet capability was detected.
    pub fn new(provider: Option<Arc<dyn ProviderGateway>>, config: WalletConfig) -> Self {
        Self {
            session: SessionHandle::new(),
            provider,
            config: Arc::new(config),
            notifier: Notifier::new(),
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn gateway(&self) -> Result<&Arc<dyn ProviderGateway>> {
        self.provider
            .as_ref()
            .ok_or_else(|| WalletError::NoProvider("no wallet provider detected, install a wallet".to_string()))
    }

    /// Ask the wallet for its accounts and make the first one active.
    ///
    /// Fails with `NoProvider` (leaving the session untouched) when there is no
    /// provider, the provider cannot be reached, or it exposes no accounts. A refresh
    /// failure after a successful connect is only published as a notice.
    pub async fn connect(&self) -> Result<Account> {
        let result = self.try_connect().await;
        if let Err(e) = &result {
            self.notifier.error(e.clone());
        }
        result
    }

    async fn try_connect(&self) -> Result<Account> {
        let gateway = self.gateway()?;
        let accounts = gateway.request_accounts().await.map_err(connect_error)?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::NoProvider("wallet exposed no accounts".to_string()))?;

        let generation = self.session.set_active_account(Some(account.clone()));
        info!(%account, "wallet connected");
        self.notifier.info(Notice::Connected(account.clone()));

        match refresh_account(
            &self.session,
            gateway.as_ref(),
            &self.config.token,
            &account,
            generation,
            RefreshScope::Full,
        )
        .await
        {
            Ok(true) => self.notifier.publish(Notice::Refreshed(account.clone())),
            Ok(false) => {}
            Err(e) => self.notifier.error(e),
        }
        Ok(account)
    }

    /// Re-fetch balances and history for the active account. `Ok(false)` if nothing
    /// is connected or the account changed while the refresh was running.
    pub async fn refresh(&self) -> Result<bool> {
        let gateway = self.gateway()?;
        let snapshot = self.session.snapshot();
        let Some(account) = snapshot.active_account().cloned() else {
            return Ok(false);
        };
        let result = refresh_account(
            &self.session,
            gateway.as_ref(),
            &self.config.token,
            &account,
            snapshot.generation(),
            RefreshScope::Full,
        )
        .await;
        match &result {
            Ok(true) => self.notifier.publish(Notice::Refreshed(account)),
            Ok(false) => {}
            Err(e) => self.notifier.error(e.clone()),
        }
        result
    }

    /// Start following account changes. Keep the guard alive as long as the component is mounted.
    pub fn mount(&self) -> Result<EventBridge> {
        let gateway = self.gateway()?.clone();
        EventBridge::start(
            self.session.clone(),
            gateway,
            self.config.token.clone(),
            self.notifier.clone(),
        )
    }

    pub fn transfers(&self) -> Result<TransferOrchestrator> {
        Ok(TransferOrchestrator::new(
            self.session.clone(),
            self.gateway()?.clone(),
            self.config.clone(),
            self.notifier.clone(),
        ))
    }

    pub async fn send(&self, recipient: &str, amount: &str) -> Result<TxReceipt> {
        match self.transfers() {
            Ok(orchestrator) => orchestrator.send(recipient, amount).await,
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }
}

fn connect_error(e: GatewayError) -> WalletError {
    WalletError::NoProvider(format!("could not get accounts from wallet: {}", e))
}
