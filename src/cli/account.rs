use crate::error::Result;
use crate::session::Session;
use crate::wallet::Wallet;

pub async fn handle_connect_command(wallet: &Wallet) -> Result<()> {
    let account = wallet.connect().await?;
    println!("Connected: {}", account);
    print_balances(wallet, &wallet.snapshot());
    Ok(())
}

pub async fn handle_balance_command(wallet: &Wallet) -> Result<()> {
    wallet.connect().await?;
    print_balances(wallet, &wallet.snapshot());
    Ok(())
}

pub async fn handle_history_command(wallet: &Wallet, limit: usize) -> Result<()> {
    let account = wallet.connect().await?;
    let snapshot = wallet.snapshot();
    println!("Transaction History for {}", account);
    print_history(&snapshot, limit);
    Ok(())
}

pub fn print_balances(wallet: &Wallet, snapshot: &Session) {
    let unknown = || "?".to_string();
    println!(
        "Balance: {} ETH",
        snapshot.native_balance().map(ToString::to_string).unwrap_or_else(unknown)
    );
    println!(
        "Token Balance: {} {}",
        snapshot.token_balance().map(ToString::to_string).unwrap_or_else(unknown),
        wallet.config().token.symbol
    );
}

pub fn print_history(snapshot: &Session, limit: usize) {
    if snapshot.history().is_empty() {
        println!("  (no transactions)");
        return;
    }
    for tx in snapshot.history().iter().take(limit) {
        let when = tx
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("  {} - {} ETH\t{}\t{}", tx.short_hash(), tx.value, tx.counterpart, when);
    }
}
