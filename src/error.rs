use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors surfaced to the user by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No wallet provider: {0}")]
    NoProvider(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("A transfer is already pending")]
    AlreadyPending,
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),
}

/// Errors returned by a provider gateway implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("RPC node returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("User rejected request")]
    Rejected,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else if e.is_connect() {
            GatewayError::Unavailable(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Parse(e.to_string())
    }
}
