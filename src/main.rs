use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use xwallet::cli::{self, Cli, Commands};
use xwallet::config::WalletConfig;
use xwallet::gateway::{JsonRpcGateway, ProviderGateway};
use xwallet::{logging, Wallet};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_filter = logging::init();

    let mut config = WalletConfig::load_or_default(&cli.config);
    if let Some(url) = cli.rpc_url {
        config.provider.rpc_url = url;
    }
    if let Some(token) = cli.token {
        config.token.contract = token;
    }

    logging::apply_config_level(&log_filter, &config.log_level);

    let provider: Option<Arc<dyn ProviderGateway>> = match JsonRpcGateway::from_config(&config) {
        Ok(gateway) => {
            info!("Provider: {}", config.provider.rpc_url);
            Some(Arc::new(gateway) as Arc<dyn ProviderGateway>)
        }
        Err(e) => {
            error!("Could not set up provider: {}", e);
            None
        }
    };
    let wallet = Wallet::new(provider, config);

    let result = match cli.command {
        Commands::Connect => cli::account::handle_connect_command(&wallet).await,
        Commands::Balance => cli::account::handle_balance_command(&wallet).await,
        Commands::History { limit } => cli::account::handle_history_command(&wallet, limit).await,
        Commands::Send { to, amount } => cli::tx::handle_send_command(&wallet, &to, &amount).await,
        Commands::Watch => cli::watch::handle_watch_command(&wallet).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
