use crate::error::Result;
use crate::wallet::Wallet;

pub async fn handle_send_command(wallet: &Wallet, to: &str, amount: &str) -> Result<()> {
    let from = wallet.connect().await?;
    println!("Sending {} ETH from {} to {}...", amount, from, to);

    let receipt = wallet.send(to, amount).await?;
    println!("Transaction Successful! Tx Hash: {}", receipt.hash);
    println!("Included in block {}", receipt.block_number);
    if let Some(balance) = wallet.snapshot().native_balance() {
        println!("New balance: {} ETH", balance);
    }
    Ok(())
}
