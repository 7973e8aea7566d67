//! Event bridge: keeps the session in step with the wallet's account-change events.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info};

use crate::config::TokenConfig;
use crate::error::{Result, WalletError};
use crate::gateway::{AccountsChangedHandler, ProviderGateway, SubscriptionId};
use crate::notify::{Notice, Notifier};
use crate::refresh::{refresh_account, RefreshScope};
use crate::session::SessionHandle;
use crate::types::Account;

/// Live subscription to account-change notifications.
///
/// The subscription is released exactly once: on [`EventBridge::stop`] or when the
/// bridge is dropped, whichever comes first. Dropping also aborts any refresh still
/// in flight so nothing writes into a session that has been torn down.
pub struct EventBridge {
    gateway: Arc<dyn ProviderGateway>,
    subscription: Option<SubscriptionId>,
    worker: Option<JoinHandle<()>>,
}

impl EventBridge {
    /// Register with the gateway. Must be called from within a tokio runtime.
    pub fn start(
        session: SessionHandle,
        gateway: Arc<dyn ProviderGateway>,
        token: TokenConfig,
        notifier: Notifier,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<(Account, u64)>();

        let handler_session = session.clone();
        let handler_notifier = notifier.clone();
        let handler: AccountsChangedHandler = Arc::new(move |accounts: Vec<Account>| {
            match accounts.into_iter().next() {
                Some(account) => {
                    let generation = handler_session.set_active_account(Some(account.clone()));
                    info!(%account, generation, "wallet account changed");
                    handler_notifier.info(Notice::Connected(account.clone()));
                    // Receiver only goes away once the bridge is stopping
                    let _ = tx.send((account, generation));
                }
                None => {
                    handler_session.set_active_account(None);
                    info!("wallet exposed no accounts, session cleared");
                    handler_notifier.info(Notice::Disconnected);
                }
            }
        });

        let subscription = gateway
            .subscribe_accounts_changed(handler)
            .map_err(|e| WalletError::NoProvider(e.to_string()))?;
        debug!(%subscription, "subscribed to account changes");

        let worker = tokio::spawn(run_refreshes(rx, session, gateway.clone(), token, notifier));

        Ok(Self {
            gateway,
            subscription: Some(subscription),
            worker: Some(worker),
        })
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Unsubscribe now instead of waiting for drop.
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.subscription.take() {
            if !self.gateway.unsubscribe(id) {
                debug!(%id, "subscription was already gone");
            }
            info!(%id, "unsubscribed from account changes");
        }
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.release();
    }
}

/// Each notification gets its own refresh task; generation tagging decides which result sticks.
async fn run_refreshes(
    mut rx: mpsc::UnboundedReceiver<(Account, u64)>,
    session: SessionHandle,
    gateway: Arc<dyn ProviderGateway>,
    token: TokenConfig,
    notifier: Notifier,
) {
    let mut refreshes = JoinSet::new();
    loop {
        tokio::select! {
            next = rx.recv() => {
                let Some((account, generation)) = next else { break };
                let (session, gateway, token, notifier) =
                    (session.clone(), gateway.clone(), token.clone(), notifier.clone());
                refreshes.spawn(async move {
                    match refresh_account(&session, gateway.as_ref(), &token, &account, generation, RefreshScope::Full).await {
                        Ok(true) => notifier.publish(Notice::Refreshed(account)),
                        Ok(false) => {}
                        Err(e) => notifier.error(e),
                    }
                });
            }
            Some(_) = refreshes.join_next(), if !refreshes.is_empty() => {}
        }
    }
    // Let in-flight refreshes finish once the sender side is gone
    while refreshes.join_next().await.is_some() {}
}
