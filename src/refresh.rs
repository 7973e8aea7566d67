//! The single refresh path shared by connect, account-change notifications and
//! post-transfer updates.

use tracing::{debug, info};

use crate::config::TokenConfig;
use crate::error::{GatewayError, Result, WalletError};
use crate::gateway::ProviderGateway;
use crate::session::{RefreshUpdate, SessionHandle};
use crate::types::{Account, Amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    /// Native balance, token balance and history
    Full,
    /// Native balance and history only (the token balance is unaffected by a native transfer)
    AfterTransfer,
}

/// Fetch derived data for `account` and apply it if `generation` is still current.
///
/// Returns `Ok(true)` when applied and `Ok(false)` when the session moved on in the
/// meantime. Partial results are applied even if another query failed; the failure is
/// then reported as `RefreshFailed`.
pub async fn refresh_account(
    session: &SessionHandle,
    gateway: &dyn ProviderGateway,
    token: &TokenConfig,
    account: &Account,
    generation: u64,
    scope: RefreshScope,
) -> Result<bool> {
    let native = gateway.get_balance(account);
    let history = gateway.get_history(account);

    let (native, token_balance, history) = match scope {
        RefreshScope::Full => {
            let token_raw = gateway.token_balance_of(&token.contract, account);
            let (native, token_raw, history) = tokio::join!(native, token_raw, history);
            let token_balance = token_raw.map(|raw| Amount::new(raw, token.decimals));
            (native, Some(token_balance), history)
        }
        RefreshScope::AfterTransfer => {
            let (native, history) = tokio::join!(native, history);
            (native, None, history)
        }
    };

    let mut failures: Vec<String> = Vec::new();
    let mut note = |what: &str, err: &GatewayError| failures.push(format!("{}: {}", what, err));

    let mut update = RefreshUpdate::default();
    match native {
        Ok(amount) => update.native_balance = Some(amount),
        Err(e) => note("balance", &e),
    }
    match token_balance {
        Some(Ok(amount)) => update.token_balance = Some(amount),
        Some(Err(e)) => note("token balance", &e),
        None => {}
    }
    match history {
        Ok(mut txs) => {
            // Newest first; not-yet-mined entries ahead of everything mined
            txs.sort_by_key(|tx| std::cmp::Reverse(tx.block_number.unwrap_or(u64::MAX)));
            update.history = Some(txs);
        }
        Err(e) => note("history", &e),
    }

    if !session.apply_refresh(generation, update) {
        debug!(%account, generation, "discarding stale refresh");
        return Ok(false);
    }

    if failures.is_empty() {
        info!(%account, ?scope, "session refreshed");
        Ok(true)
    } else {
        Err(WalletError::RefreshFailed(failures.join("; ")))
    }
}
