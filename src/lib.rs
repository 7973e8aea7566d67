pub mod bridge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod refresh;
pub mod session;
pub mod transfer;
pub mod types;
pub mod units;
pub mod wallet;
pub mod cli;

pub use error::{GatewayError, Result, WalletError};
pub use wallet::Wallet;
