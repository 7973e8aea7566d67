use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::account::{print_balances, print_history};
use crate::error::Result;
use crate::notify::Notice;
use crate::wallet::Wallet;

pub async fn handle_watch_command(wallet: &Wallet) -> Result<()> {
    if !wallet.has_provider() {
        warn!("no provider configured, nothing to watch");
    }
    let mut notices = wallet.subscribe_notices();
    // Dropped on every return path, which releases the subscription
    let _bridge = wallet.mount()?;

    if let Err(e) = wallet.connect().await {
        println!("Not connected yet: {}", e);
    }
    println!("Watching for account changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(Notice::Connected(account)) => println!("\nAccount: {}", account),
                Ok(Notice::Disconnected) => println!("\nWallet disconnected"),
                Ok(Notice::Refreshed(_)) => {
                    let snapshot = wallet.snapshot();
                    if !snapshot.is_connected() {
                        continue;
                    }
                    print_balances(wallet, &snapshot);
                    print_history(&snapshot, 5);
                }
                Ok(Notice::Error(e)) => println!("Error: {}", e),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("skipped {} notices", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
