pub mod account;
pub mod tx;
pub mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xwallet")]
#[command(about = "Wallet session client: balances, history and transfers", long_about = None)]
pub struct Cli {
    /// Path to the TOML config (created with defaults if missing)
    #[arg(long, default_value = "xwallet.toml")]
    pub config: String,
    /// Override the provider JSON-RPC endpoint
    #[arg(long)]
    pub rpc_url: Option<String>,
    /// Override the ERC-20 token contract to show a balance for
    #[arg(long)]
    pub token: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the wallet and show the active account
    Connect,
    /// Native and token balance of the active account
    Balance,
    /// Transaction history of the active account
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Send native currency from the active account
    Send {
        #[arg(long)]
        to: String,
        /// Decimal amount, e.g. 1.5
        #[arg(long)]
        amount: String,
    },
    /// Follow account changes until interrupted
    Watch,
}
