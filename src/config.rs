use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WalletConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub provider: ProviderConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub rpc_url: String,
    /// Etherscan-compatible API endpoint used for transaction history
    pub history_url: String,
    #[serde(default)]
    pub history_api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_account_poll_interval_ms")]
    pub account_poll_interval_ms: u64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TokenConfig {
    pub contract: String,
    #[serde(default = "default_token_decimals")]
    pub decimals: u8,
    #[serde(default = "default_token_symbol")]
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransferConfig {
    /// 0 waits for confirmation indefinitely
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_account_poll_interval_ms() -> u64 {
    1000
}

fn default_receipt_poll_interval_ms() -> u64 {
    2000
}

fn default_token_decimals() -> u8 {
    18
}

fn default_token_symbol() -> String {
    "TOKEN".to_string()
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            provider: ProviderConfig {
                rpc_url: "http://localhost:8545".to_string(),
                history_url: "https://api.etherscan.io/api".to_string(),
                history_api_key: None,
                request_timeout_secs: default_request_timeout_secs(),
                account_poll_interval_ms: default_account_poll_interval_ms(),
                receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            },
            token: TokenConfig {
                contract: "0x0000000000000000000000000000000000000000".to_string(),
                decimals: default_token_decimals(),
                symbol: default_token_symbol(),
            },
            transfer: TransferConfig::default(),
        }
    }
}

impl WalletConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                if let Err(e) = std::fs::write(path, s) {
                    warn!("Could not write default config to '{}': {}", path, e);
                }
            }
            config
        }
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        match self.transfer.confirmation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_secs)
    }

    pub fn account_poll_interval(&self) -> Duration {
        Duration::from_millis(self.provider.account_poll_interval_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.provider.receipt_poll_interval_ms)
    }
}
